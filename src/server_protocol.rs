use serde_json::Value;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Configure {
        player_count: Option<i64>,
        height: Option<i64>,
    },
    Generate,
    Start,
    Reset,
    Rename {
        player_id: String,
        name: String,
    },
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "configure" => {
            let player_count = parse_optional_i64(object.get("playerCount"))?;
            let height = parse_optional_i64(object.get("height"))?;
            Some(ParsedClientMessage::Configure {
                player_count,
                height,
            })
        }
        "generate" => Some(ParsedClientMessage::Generate),
        "start" => Some(ParsedClientMessage::Start),
        "reset" => Some(ParsedClientMessage::Reset),
        "rename" => {
            let player_id = object.get("playerId")?.as_str()?.to_string();
            let name = object.get("name")?.as_str()?.to_string();
            Some(ParsedClientMessage::Rename { player_id, name })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored.abs() > MAX_SAFE_INTEGER_F64 {
                return None;
            }
            return Some(Some(floored as i64));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_configure_message() {
        let parsed = parse_client_message(r#"{"type":"configure","playerCount":5,"height":12}"#)
            .expect("configure message should parse");
        assert_eq!(
            parsed,
            ParsedClientMessage::Configure {
                player_count: Some(5),
                height: Some(12),
            }
        );
    }

    #[test]
    fn parse_configure_allows_partial_and_null_fields() {
        let parsed = parse_client_message(r#"{"type":"configure","height":null}"#)
            .expect("configure message should parse");
        assert_eq!(
            parsed,
            ParsedClientMessage::Configure {
                player_count: None,
                height: None,
            }
        );
    }

    #[test]
    fn parse_configure_floors_float_values() {
        let parsed = parse_client_message(r#"{"type":"configure","playerCount":3.9}"#)
            .expect("configure message should parse");
        assert!(matches!(
            parsed,
            ParsedClientMessage::Configure {
                player_count: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn parse_configure_rejects_non_numeric_and_overflow() {
        assert!(parse_client_message(r#"{"type":"configure","playerCount":"four"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"configure","height":1e100}"#).is_none());
        assert!(
            parse_client_message(r#"{"type":"configure","height":18446744073709551615}"#)
                .is_none()
        );
    }

    #[test]
    fn parse_bare_commands() {
        assert_eq!(
            parse_client_message(r#"{"type":"generate"}"#),
            Some(ParsedClientMessage::Generate)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"start"}"#),
            Some(ParsedClientMessage::Start)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"reset"}"#),
            Some(ParsedClientMessage::Reset)
        );
    }

    #[test]
    fn parse_rename_requires_both_fields() {
        let parsed = parse_client_message(r#"{"type":"rename","playerId":"dino_1","name":"Rex"}"#);
        assert_eq!(
            parsed,
            Some(ParsedClientMessage::Rename {
                player_id: "dino_1".to_string(),
                name: "Rex".to_string(),
            })
        );
        assert!(parse_client_message(r#"{"type":"rename","name":"Rex"}"#).is_none());
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        let parsed = parse_client_message(r#"{"type":"ping","t":12.5}"#);
        assert!(matches!(parsed, Some(ParsedClientMessage::Ping { .. })));
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
    }

    #[test]
    fn unknown_or_malformed_messages_are_rejected() {
        assert!(parse_client_message(r#"{"type":"jump"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
        assert!(parse_client_message("[1,2]").is_none());
    }
}
