use crate::{auth::repo_types::Goal, nutrition::aggregate::Totals};

pub const NUTRITION_MAX_TOKENS: u32 = 500;
pub const MEAL_PLAN_MAX_TOKENS: u32 = 500;
pub const INSIGHT_MAX_TOKENS: u32 = 200;
pub const CALORIE_MAX_TOKENS: u32 = 50;

pub fn nutrition_prompt(
    food_name: &str,
    ingredients: &str,
    preparation: &str,
    goal: Option<Goal>,
) -> String {
    let goal_context = goal
        .map(|g| format!("Keep in mind that my primary goal is {g}. "))
        .unwrap_or_default();
    format!(
        "You are a certified nutritionist AI. Provide a detailed nutrition breakdown as JSON. \
         The 'insight' should be a short health recommendation about this specific food. \
         {goal_context}Your response must follow this exact JSON structure:\n\
         {{ \"calories\": {{\"value\": number, \"unit\": \"kcal\"}}, \"protein\": {{\"value\": number, \"unit\": \"g\"}}, \
         \"carbohydrates\": {{\"value\": number, \"unit\": \"g\"}}, \"fats\": {{\"value\": number, \"unit\": \"g\"}}, \
         \"sugars\": {{\"value\": number, \"unit\": \"g\"}}, \"fibre\": {{\"value\": number, \"unit\": \"g\"}}, \
         \"vitamins\": {{\"Vitamin A\": {{\"value\": number, \"unit\": \"mcg\"}}, \"Vitamin C\": {{\"value\": number, \"unit\": \"mg\"}}}}, \
         \"minerals\": {{\"Calcium\": {{\"value\": number, \"unit\": \"mg\"}}, \"Iron\": {{\"value\": number, \"unit\": \"mg\"}}}}, \
         \"insight\": \"Short health recommendation\", \"notes\": \"Any assumptions\"}}\n\
         Respond with valid JSON only.\n\n\
         Food Name: {food_name}\nIngredients: {ingredients}\nPreparation: {preparation}"
    )
}

pub fn meal_plan_prompt(requirements: &str, goal: Option<Goal>) -> String {
    let goal_context = goal
        .map(|g| {
            format!("The entire meal plan should be tailored to help me achieve my goal of {g}. ")
        })
        .unwrap_or_default();
    format!(
        "You are a dietitian AI. Provide a meal plan JSON. The 'insights' should be a health recommendation. \
         {goal_context}Your response must follow this exact JSON structure:\n\
         {{ \"meal_name\": \"string\", \"ingredients\": [\"list\"], \"preparation\": \"string\", \
         \"nutrition\": {{\"calories\": number, \"protein\": number, \"carbs\": number, \"fats\": number, \"sugars\": number, \"fibre\": number}}, \
         \"vitamins\": {{\"Vitamin A\": number, \"Vitamin C\": number}}, \"minerals\": {{\"Calcium\": number, \"Iron\": number}}, \
         \"insights\": \"Health recommendation\"}}\n\
         Respond only with JSON.\n\n\
         User Requirements: {requirements}"
    )
}

pub fn insight_prompt(
    totals: &Totals,
    food_count: usize,
    calorie_target: Option<i32>,
    goal: Option<Goal>,
) -> String {
    let mut details = format!(
        "Your totals today: Calories: {} kcal, Protein: {} g, Fats: {} g.\nTotal foods logged: {}.",
        totals.calories, totals.protein, totals.fats, food_count
    );
    if let Some(target) = calorie_target {
        details.push_str(&format!("\nYour recommended calorie target is {target} kcal."));
    }
    if let Some(goal) = goal {
        details.push_str(&format!("\nYour current goal is: {goal}."));
    }
    format!(
        "You are a helpful and friendly nutrition coach speaking directly to me, the user. \
         Use a supportive tone and the words 'You' and 'Your'. \
         Based on my data and my primary goal below, provide a short JSON insight with three keys: \
         'food_insight', 'calorie_insight', and 'tip'. The tip should be relevant to my goal.\n\n\
         My Data for Today:\n{details}\n\nRespond with valid JSON only."
    )
}

pub struct CalorieInputs<'a> {
    pub age: i32,
    pub gender: &'a str,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub bmi: Option<f64>,
    pub activity_level: &'a str,
    pub goal: Goal,
}

pub fn calorie_prompt(input: &CalorieInputs<'_>) -> String {
    let bmi = input
        .bmi
        .map(|b| b.to_string())
        .unwrap_or_else(|| "unknown".into());
    format!(
        "You are an expert nutritionist. Based on the following user data, calculate the recommended daily calorie intake. \
         First, calculate the user's Total Daily Energy Expenditure (TDEE). Then, adjust this value based on their goal: \
         for 'Weight Loss', create a sensible deficit (around 300-500 kcal); \
         for 'Weight Gain', create a sensible surplus (around 300-500 kcal); \
         for 'Maintain Weight', stick to the TDEE. \
         Also consider their BMI in your final recommendation. \
         Respond ONLY with a valid JSON object in the format {{\"recommended_calories\": number}}.\n\n\
         User Data:\n- Age: {}\n- Gender: {}\n- Height: {} cm\n- Weight: {} kg\n- BMI: {}\n- Activity Level: {}\n- Primary Goal: {}",
        input.age,
        input.gender,
        input.height_cm,
        input.weight_kg,
        bmi,
        input.activity_level,
        input.goal
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutrition_prompt_mentions_goal_only_when_set() {
        let with_goal = nutrition_prompt("Oatmeal", "oats, milk", "boiled", Some(Goal::WeightLoss));
        assert!(with_goal.contains("my primary goal is Weight Loss"));
        assert!(
            with_goal.contains("Food Name: Oatmeal\nIngredients: oats, milk\nPreparation: boiled")
        );
        assert!(with_goal.contains("\"fibre\": {\"value\": number, \"unit\": \"g\"}"));

        let without = nutrition_prompt("Oatmeal", "oats", "", None);
        assert!(!without.contains("primary goal"));
    }

    #[test]
    fn insight_prompt_lists_optional_target_and_goal() {
        let totals = Totals {
            calories: 1800,
            protein: 90,
            fats: 60,
            ..Totals::default()
        };
        let prompt = insight_prompt(&totals, 4, Some(2200), Some(Goal::MaintainWeight));
        assert!(prompt.contains("Calories: 1800 kcal, Protein: 90 g, Fats: 60 g."));
        assert!(prompt.contains("Total foods logged: 4."));
        assert!(prompt.contains("recommended calorie target is 2200 kcal"));
        assert!(prompt.contains("current goal is: Maintain Weight"));

        let bare = insight_prompt(&totals, 1, None, None);
        assert!(!bare.contains("calorie target"));
        assert!(!bare.contains("current goal"));
    }

    #[test]
    fn calorie_prompt_embeds_derived_values() {
        let prompt = calorie_prompt(&CalorieInputs {
            age: 34,
            gender: "Female",
            height_cm: 165.0,
            weight_kg: 60.0,
            bmi: Some(22.0),
            activity_level: "Moderately active",
            goal: Goal::WeightGain,
        });
        assert!(prompt.contains("- Age: 34\n"));
        assert!(prompt.contains("- BMI: 22\n"));
        assert!(prompt.contains("- Primary Goal: Weight Gain"));
    }
}
