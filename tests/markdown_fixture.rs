use forumdown::application::elements::ElementParser;
use forumdown::application::markdown::render_markdown;
use forumdown::domain::{ElementKind, FontWeight, RenderConfiguration, Stylesheet};

fn load_markdown() -> &'static str {
    include_str!("fixtures/forum_post.md")
}

#[test]
fn forum_post_plain_text_matches_fixture() {
    let document = render_markdown(load_markdown(), &Stylesheet::default());

    let expected = include_str!("fixtures/forum_post.txt");
    assert_eq!(expected.trim_end(), document.plain_text().trim_end());
}

#[test]
fn forum_post_styles_mentions_and_bold() {
    let sheet = Stylesheet::default();
    let document = render_markdown(load_markdown(), &sheet);

    let mention = document
        .runs()
        .iter()
        .find(|run| run.text == "@alice")
        .expect("mention run");
    assert_eq!(mention.style.foreground, sheet.mention.color);
    assert_eq!(mention.style.background, Some(sheet.mention.background));

    let bold = document
        .runs()
        .iter()
        .find(|run| run.text == "fast")
        .expect("bold run");
    assert_eq!(bold.style.weight, FontWeight::Bold);

    let title = &document.runs()[0];
    assert_eq!(title.style.font_size, sheet.heading_size(1));
}

#[test]
fn forum_post_paragraph_runs_snapshot() {
    let elements = ElementParser::default().parse(load_markdown(), &RenderConfiguration::default());

    let ElementKind::Text { document } = &elements[1].kind else {
        panic!("expected paragraph, got {:?}", elements[1].kind);
    };
    let runs: Vec<&str> = document.runs().iter().map(|run| run.text.as_str()).collect();
    insta::assert_snapshot!(runs.join("|"), @"Thanks |@alice| for the |fast| fix.");
}

#[test]
fn forum_post_element_outline() {
    let elements = ElementParser::default().parse(load_markdown(), &RenderConfiguration::default());

    assert!(matches!(
        &elements[0].kind,
        ElementKind::Heading { text, level: 1 } if text == "Release notes"
    ));
    assert!(
        elements[1..]
            .iter()
            .all(|element| matches!(element.kind, ElementKind::Text { .. }))
    );
    let mentions: usize = elements
        .iter()
        .map(|element| forumdown::application::mentions::find_mentions(&element.plain_text()).len())
        .sum();
    assert_eq!(mentions, 1);
}
