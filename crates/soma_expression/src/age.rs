use soma_limbic::LifeStage;

/// Narration for the persona's age, if their stage and years call for one.
pub fn age_sensation(stage: LifeStage, years: u32) -> Option<&'static str> {
    match stage {
        LifeStage::Infant => Some("You are a tiny baby; everything around you is huge and new."),
        LifeStage::Child if years < 6 => {
            Some("You are a small child, curious about everything and easily tired.")
        }
        LifeStage::Child => Some("You are a school-age kid, full of energy and questions."),
        LifeStage::Teen => Some("You are a teenager; your body is changing and moods swing fast."),
        LifeStage::Adult if years == 18 => Some("You have just come of age."),
        LifeStage::Adult => None,
        LifeStage::MiddleAdult => Some("Your body is starting to slow down; recovery takes longer."),
        LifeStage::Senior => Some("You are elderly; your joints ache and you tire easily."),
    }
}
