//! contact_validator：校验并规范化线索留下的电话号码（PHONE 阶段解锁）

use async_trait::async_trait;
use serde_json::Value;

use crate::intake::normalize_phone;
use crate::tools::Tool;

pub struct ContactValidatorTool;

#[async_trait]
impl Tool for ContactValidatorTool {
    fn name(&self) -> &str {
        "contact_validator"
    }

    fn description(&self) -> &str {
        "Validate and normalize a phone number. Args: {\"phone\": \"+49 30 1234567\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "phone": { "type": "string", "description": "Phone number as typed by the lead" }
            },
            "required": ["phone"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let raw = args
            .get("phone")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing phone".to_string())?;
        let normalized = normalize_phone(raw).map_err(|e| e.to_string())?;
        Ok(serde_json::json!({ "valid": true, "normalized": normalized }).to_string())
    }
}
