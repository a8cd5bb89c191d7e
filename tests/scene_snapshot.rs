use card_composer::settings::Settings;
use card_composer::{CardComposer, CardState, Language};

fn composer(assets: &std::path::Path) -> CardComposer {
    CardComposer::new(Settings::default(), Some(assets), None).expect("composer")
}

#[test]
fn card_scene_for_a_short_name() {
    let assets = tempfile::tempdir().expect("tempdir");
    let composer = composer(assets.path());
    let mut card = CardState::new(composer.settings());
    card.language = Language::from_code("en");
    card.name = "Sara".to_string();

    let svg = composer.scene(&card).expect("scene");
    insta::assert_snapshot!("sara_scene", svg);
}

#[test]
fn card_scene_without_a_name() {
    let assets = tempfile::tempdir().expect("tempdir");
    let composer = composer(assets.path());
    let mut card = CardState::new(composer.settings());
    card.name = "   ".to_string();

    let svg = composer.scene(&card).expect("scene");
    insta::assert_snapshot!("nameless_scene", svg);
}
