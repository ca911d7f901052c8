use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::llm::{generate_json, ChatModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub recommended_traits: Vec<String>,
    #[serde(default)]
    pub effort_estimate_mins: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBreakdown {
    pub tasks: Vec<PlannedTask>,
}

pub fn breakdown_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tasks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "requirements": { "type": "string" },
                        "recommendedTraits": { "type": "array", "items": { "type": "string" } },
                        "effortEstimateMins": { "type": "number" }
                    },
                    "required": ["title", "description", "requirements", "recommendedTraits", "effortEstimateMins"]
                }
            }
        },
        "required": ["tasks"]
    })
}

/// Splits a free-form project plan into tasks matched to employee traits.
pub async fn process_project(
    model: &dyn ChatModel,
    project_plan: &str,
    employees: &Value,
) -> Result<ProjectBreakdown, AppError> {
    let prompt = format!(
        "Analyze this project plan: \"{project_plan}\"\n\nGenerate a list of tasks. For each task, specify:\n\
         1. Title and Description\n\
         2. Technical/Personal requirements\n\
         3. Recommended psychological traits for the employee (e.g., \"Deep focus\", \"Creative\", \"Detail-oriented\")\n\
         4. Effort estimate in minutes.\n\n\
         Available Employees (Psychology): {employees}"
    );
    let value = generate_json(model, &prompt, breakdown_schema()).await?;
    Ok(serde_json::from_value(value)?)
}
