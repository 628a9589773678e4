use speech_panel::tts::{Voice, VoiceAge, VoiceGender};

fn unknown(name: &str) -> Voice {
    Voice::new(name, VoiceGender::Unknown, VoiceAge::Other)
}

#[test]
fn test_language_prefix_is_stripped() {
    let voice = unknown("English+grandma");
    assert_eq!(Some("grandma - Female".to_string()), voice.display_name("English"));

    let voice = unknown("English+Klatt");
    assert_eq!(Some("Klatt".to_string()), voice.display_name("English"));
}

#[test]
fn test_name_is_kept_when_prefix_does_not_match() {
    let voice = Voice::new("en-us-x-sfg#female_2", VoiceGender::Unknown, VoiceAge::Adult);
    assert_eq!(
        Some("en-us-x-sfg#female_2 - Female - Adult".to_string()),
        voice.display_name("English")
    );
}

#[test]
fn test_name_is_kept_for_a_reported_gender() {
    let voice = Voice::new("en-us-x-sfg#female_2", VoiceGender::Female, VoiceAge::Adult);
    assert_eq!(
        Some("en-us-x-sfg#female_2 - Female - Adult".to_string()),
        voice.display_name("English")
    );
}

#[test]
fn test_reported_gender_wins_over_inference() {
    let voice = Voice::new("Microsoft Zira", VoiceGender::Female, VoiceAge::Adult);
    assert_eq!(Some("Microsoft Zira - Female - Adult".to_string()), voice.display_name("English"));

    let voice = Voice::new("female_imitator", VoiceGender::Male, VoiceAge::Other);
    assert_eq!(Some("female_imitator - Male".to_string()), voice.display_name("German"));
}

#[test]
fn test_female_is_checked_before_male() {
    assert_eq!(VoiceGender::Female, VoiceGender::infer_from("Female"));
    assert_eq!(VoiceGender::Male, VoiceGender::infer_from("MALE3"));
    assert_eq!(VoiceGender::Male, VoiceGender::infer_from("grandpa"));
    assert_eq!(VoiceGender::Unknown, VoiceGender::infer_from("Klatt"));
}

#[test]
fn test_nothing_left_to_show() {
    assert_eq!(None, unknown("English").display_name("English"));
    assert_eq!(None, unknown("English+").display_name("English"));
    assert_eq!(None, unknown("").display_name("English"));
}

#[test]
fn test_empty_name_still_shows_attributes() {
    let voice = Voice::new("", VoiceGender::Male, VoiceAge::Senior);
    assert_eq!(Some("Male - Senior".to_string()), voice.display_name("English"));
}

#[test]
fn test_lenient_attribute_parsing() {
    assert_eq!(VoiceGender::Female, VoiceGender::parse_lenient("female"));
    assert_eq!(VoiceGender::Unknown, VoiceGender::parse_lenient("Neutral"));
    assert_eq!(VoiceGender::Unknown, VoiceGender::parse_lenient("robot"));
    assert_eq!(VoiceAge::Teenager, VoiceAge::parse_lenient("Teen"));
    assert_eq!(VoiceAge::Senior, VoiceAge::parse_lenient(" senior "));
    assert_eq!(VoiceAge::Other, VoiceAge::parse_lenient(""));
    assert_eq!("Teenager", VoiceAge::Teenager.to_string());
}
