//! Built-in nutrition profiles and the health-report analysis instruction.

use crate::error::{SchemaError, TemplateError};
use crate::form::{FormField, FormSchema};
use crate::template::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CHAT_HISTORY_FIELD: &str = "chat_history";
pub const USER_INPUT_FIELD: &str = "user_input";

pub const NUTRITION_TEMPLATE: &str = "
You are a professional nutritionist. Based on the following user information, create a personalized nutrition plan:

User Information:
- Age: {age}
- Weight: {weight} kg
- Height: {height} cm
- Activity Level: {activity_level}
- Dietary Restrictions: {dietary_restrictions}
- Goals: {goals}

Please provide:
1. Daily caloric needs
2. Macronutrient distribution
3. Meal plan suggestions
4. Specific food recommendations
5. Supplements if needed

Previous conversation context:
{chat_history}

User Query: {user_input}

Please provide a detailed and personalized response:
";

pub const INDIAN_NUTRITION_TEMPLATE: &str = "
You are an expert Indian nutritionist. Based on the following user information, provide a personalized Indian diet plan:

User Profile:
Height: {height} cm
Weight: {weight} kg
Age: {age}
Activity Level: {activity_level}
Goals: {goals}
Dietary Preferences: {dietary_preferences}
Health Issues: {health_issues}

Please provide a detailed Indian diet plan including:
1. Calculate daily calorie requirements
2. Provide macronutrient distribution (proteins, carbs, fats)
3. Suggest a full day meal plan with traditional Indian foods including:
   - Early morning (if applicable)
   - Breakfast
   - Mid-morning snack
   - Lunch
   - Evening snack
   - Dinner
4. Include specific Indian dishes and portion sizes
5. Mention which region each dish is from
6. Include spices and ingredients that have additional health benefits
7. Hydration recommendations including traditional Indian drinks

Previous conversation context:
{chat_history}

User Question: {user_input}

Guidelines for responses:
- Focus on traditional Indian ingredients and dishes
- Include regional varieties when possible
- Suggest healthy Indian alternatives to processed foods
- Include traditional wisdom about spices and herbs
- Provide measurements in Indian kitchen units (katori, cups, etc.)
";

pub const HEALTH_REPORT_INSTRUCTION: &str = "Analyze the patient's health data to identify deficiencies. Provide recommendations in the following format:

Recommendations:
- Food Item: [Name of the food item]
  - Suggested Duration: [Duration for consumption]

List each deficiency and specific food items that should be consumed to address it, along with the recommended duration for consumption.";

pub const ANALYSIS_MAX_TOKENS: u32 = 500;

/// The instruction followed by a blank line and the extracted document text.
/// Document text is appended as-is, so braces inside it are never treated as
/// placeholders.
pub fn analysis_prompt(instruction: &str, document_text: &str) -> String {
    format!("{instruction}\n\n{document_text}")
}

const INDIAN_ACTIVITY_LEVELS: &[&str] = &[
    "Sedentary (Office job, minimal exercise)",
    "Lightly Active (Light exercise 1-3 days/week)",
    "Moderately Active (Exercise 3-5 days/week)",
    "Very Active (Exercise 6-7 days/week)",
    "Extremely Active (Athletic training)",
];

const INDIAN_GOALS: &[&str] = &[
    "Weight Loss",
    "Weight Gain",
    "Muscle Gain",
    "Maintenance",
    "Better Energy Levels",
    "Blood Sugar Management",
    "Heart Health",
];

const INDIAN_DIETARY_PREFERENCES: &[&str] = &[
    "Vegetarian",
    "Vegan",
    "Non-Vegetarian",
    "Jain",
    "No Onion-Garlic",
    "South Indian",
    "North Indian",
    "Gujarati",
    "Bengali",
    "Punjabi",
];

const INDIAN_HEALTH_ISSUES: &[&str] = &[
    "None",
    "Diabetes",
    "Hypertension",
    "Cholesterol",
    "Thyroid",
    "PCOS",
    "Lactose Intolerance",
    "Gluten Sensitivity",
];

/// Every placeholder other than the history and query must name a schema field.
pub fn check_template(template: &PromptTemplate, schema: &FormSchema) -> Result<(), TemplateError> {
    let unbound: Vec<String> = template
        .required_fields()
        .iter()
        .filter(|name| {
            let name = name.as_str();
            name != CHAT_HISTORY_FIELD && name != USER_INPUT_FIELD && schema.field(name).is_none()
        })
        .cloned()
        .collect();
    if unbound.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::Unbound(unbound))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Standard,
    Indian,
}

impl Profile {
    pub fn title(&self) -> &'static str {
        match self {
            Profile::Standard => "Personalized Nutrition Planner",
            Profile::Indian => "Indian Nutrition Planning Assistant",
        }
    }

    pub fn template(&self) -> PromptTemplate {
        match self {
            Profile::Standard => PromptTemplate::new(NUTRITION_TEMPLATE),
            Profile::Indian => PromptTemplate::new(INDIAN_NUTRITION_TEMPLATE),
        }
    }

    pub fn schema(&self) -> Result<FormSchema, SchemaError> {
        let fields = match self {
            Profile::Standard => vec![
                FormField::number("age", "Age", 1.0, 120.0, 30.0),
                FormField::number("weight", "Weight (kg)", 20.0, 300.0, 70.0),
                FormField::number("height", "Height (cm)", 100.0, 250.0, 170.0),
                FormField::single_choice(
                    "activity_level",
                    "Activity Level",
                    &["Sedentary", "Light", "Moderate", "Very Active", "Extremely Active"],
                    "Moderate",
                ),
                FormField::free_text("dietary_restrictions", "Dietary Restrictions", "None"),
                FormField::free_text("goals", "Fitness/Health Goals", "Weight maintenance"),
            ],
            Profile::Indian => vec![
                FormField::number("height", "Height (cm)", 100.0, 250.0, 165.0),
                FormField::number("weight", "Weight (kg)", 30.0, 200.0, 65.0),
                FormField::number("age", "Age", 15.0, 100.0, 30.0),
                FormField::single_choice(
                    "activity_level",
                    "Activity Level",
                    INDIAN_ACTIVITY_LEVELS,
                    INDIAN_ACTIVITY_LEVELS[0],
                ),
                FormField::single_choice("goals", "Fitness Goals", INDIAN_GOALS, INDIAN_GOALS[0]),
                FormField::multi_choice(
                    "dietary_preferences",
                    "Dietary Preferences",
                    INDIAN_DIETARY_PREFERENCES,
                    &["Vegetarian"],
                ),
                FormField::multi_choice(
                    "health_issues",
                    "Health Issues",
                    INDIAN_HEALTH_ISSUES,
                    &["None"],
                ),
            ],
        };
        FormSchema::new(fields)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Standard => f.write_str("standard"),
            Profile::Indian => f.write_str("indian"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Profile::Standard),
            "indian" => Ok(Profile::Indian),
            other => Err(format!("unknown profile `{other}` (expected standard or indian)")),
        }
    }
}
