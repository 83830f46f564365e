use crate::Error;
use serde::Serialize;

/// The single JSON object a command writes to stdout.
///
/// Payload fields are always present, so a failed invocation still carries
/// the success shape with empty values next to `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    #[serde(flatten)]
    pub payload: T,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Default> Envelope<T> {
    pub fn success(payload: T) -> Self {
        Self {
            payload,
            success: true,
            error: None,
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            payload: T::default(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn exit_status(&self) -> u8 {
        if self.success { 0 } else { 1 }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "error": format!("Serialization error: {}", e),
                "success": false,
            })
            .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct Sample {
        caption: String,
    }

    #[test]
    fn test_success_envelope_shape() {
        let envelope = Envelope::success(Sample {
            caption: "a fridge full of food".to_string(),
        });

        let value: Value = serde_json::from_str(&envelope.to_json_line()).unwrap();
        assert_eq!(
            value,
            json!({"caption": "a fridge full of food", "success": true})
        );
        assert_eq!(envelope.exit_status(), 0);
    }

    #[test]
    fn test_failure_envelope_keeps_default_payload() {
        let envelope = Envelope::<Sample>::failure(&Error::Api { status: 500 });

        let value: Value = serde_json::from_str(&envelope.to_json_line()).unwrap();
        assert_eq!(
            value,
            json!({"caption": "", "success": false, "error": "Ollama API error: 500"})
        );
        assert_eq!(envelope.exit_status(), 1);
    }

    #[test]
    fn test_json_line_is_single_line() {
        let envelope = Envelope::success(Sample {
            caption: "line one\nline two".to_string(),
        });
        assert_eq!(envelope.to_json_line().lines().count(), 1);
    }
}
