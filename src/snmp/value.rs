use snmp2::Value;

/// Переводит значение varbind в строку.
/// `None` для исключений (noSuchObject/noSuchInstance/endOfMibView) и Null.
pub fn render_value(value: &Value<'_>) -> Option<String> {
    match value {
        Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView | Value::Null => None,
        Value::Integer(v) => Some(v.to_string()),
        Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => Some(v.to_string()),
        Value::Counter64(v) => Some(v.to_string()),
        Value::Boolean(v) => Some(if *v { "1".into() } else { "0".into() }),
        Value::OctetString(bytes) => Some(
            String::from_utf8_lossy(bytes)
                .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string(),
        ),
        Value::ObjectIdentifier(oid) => Some(oid.to_string()),
        Value::IpAddress([a, b, c, d]) => Some(format!("{}.{}.{}.{}", a, b, c, d)),
        other => Some(format!("{:?}", other)),
    }
}
