use speech_panel::tts::{Pitch, Rate, SpeechMarkup, Volume};

#[test]
fn test_slider_conversion() {
    assert_eq!(0.5, Rate::from_slider(5).value());
    assert_eq!(-1.0, Pitch::from_slider(-20).value());
    assert_eq!(0.7, Volume::from_slider(70).value());
    assert_eq!(0.0, Volume::new(-3.0).value());
    assert_eq!(-1.0, Rate::new(f64::NAN).value());
    assert_eq!(7, Volume::new(0.07).to_slider());
    assert_eq!(-10, Pitch::new(-1.0).to_slider());
}

#[test]
fn test_speech_markup() {
    let xml = SpeechMarkup::new()
        .start_rate(Rate::new(-0.3))
        .start_volume(Volume::new(1.0))
        .say("a < b & c")
        .finish()
        .unwrap();
    assert_eq!(
        r#"<rate absspeed="-3"><volume level="100">a &lt; b &amp; c</volume></rate>"#,
        xml
    );
}

#[test]
fn test_nested_markup_is_closed_in_order() {
    let xml = SpeechMarkup::new()
        .start_pitch(Pitch::new(-0.2))
        .say("low")
        .end()
        .say(" normal")
        .finish()
        .unwrap();
    assert_eq!(r#"<pitch absmiddle="-2">low</pitch> normal"#, xml);
}
