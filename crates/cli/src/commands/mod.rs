pub mod doctor;
pub mod migrate;
pub mod pools;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::CommandResult;

    #[test]
    fn success_results_are_single_line_json() {
        let result = CommandResult::success("migrate", "applied pending migrations");
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("\"status\":\"ok\""));
        assert!(!result.output.contains('\n'));
    }

    #[test]
    fn failure_results_carry_an_error_class_and_exit_code() {
        let result = CommandResult::failure("migrate", "db_connectivity", "no such file", 4);
        assert_eq!(result.exit_code, 4);
        assert!(result.output.contains("\"error_class\":\"db_connectivity\""));
    }
}
