use qa_rule_picker::controller::Event;
use qa_rule_picker::dom::{ElementNode, PageSnapshot};
use qa_rule_picker::picker::{ClickOutcome, InputEvent, PickerState, Role};
use qa_rule_picker::{Command, Controller, Page, Picker, Step};

/// Two questions, three answers each, laid out top to bottom
fn quiz_page() -> Page {
    let mut body = ElementNode::new("body").with_bounding_box(0.0, 0.0, 1000.0, 800.0);
    for q in 0..2 {
        let top = q as f64 * 300.0;
        let mut card = ElementNode::new("div").with_class("card").with_bounding_box(0.0, top, 1000.0, 280.0);
        card.add_child(
            ElementNode::new("h2")
                .with_class("stem")
                .with_text(format!("Question {}", q + 1))
                .with_bounding_box(20.0, top + 10.0, 600.0, 40.0),
        );
        for a in 0..3 {
            card.add_child(
                ElementNode::new("div")
                    .with_class("option")
                    .with_text(format!("Option {}{}", q + 1, a + 1))
                    .with_bounding_box(20.0, top + 70.0 + a as f64 * 60.0, 600.0, 40.0),
            );
        }
        body.add_child(card);
    }
    Page::from_snapshot(&PageSnapshot { url: "https://lms.example.com/unit/3/quiz/".into(), title: "Quiz".into(), root: body })
}

const QUESTION: (f64, f64) = (100.0, 30.0);
const FIRST_ANSWER: (f64, f64) = (100.0, 90.0);
const SECOND_ANSWER: (f64, f64) = (100.0, 150.0);

#[test]
fn test_reset_restores_initial_state() {
    let page = quiz_page();
    let mut picker = Picker::default();
    picker.activate();
    let initial = picker.state().cloned();

    picker.click(&page, QUESTION.0, QUESTION.1);
    picker.click(&page, FIRST_ANSWER.0, FIRST_ANSWER.1);
    picker.exclude_node(page.query_all(".option")[2]);
    assert_eq!(picker.step(), Step::PickCorrect);
    assert!(picker.overlay().marker_count() > 0);

    assert!(picker.reset());
    assert_eq!(picker.state().cloned(), initial);
    assert_eq!(picker.state(), Some(&PickerState::initial()));
    assert_eq!(picker.overlay().marker_count(), 0);
    assert!(picker.is_active());
}

#[test]
fn test_activation_cycles_leave_nothing_behind() {
    let page = quiz_page();
    let mut picker = Picker::default();

    for _ in 0..5 {
        picker.activate();
        picker.activate();
        picker.pointer_move(&page, QUESTION.0, QUESTION.1);
        picker.click(&page, QUESTION.0, QUESTION.1);
        picker.deactivate();
        picker.deactivate();
    }

    assert!(picker.overlay().is_clean());
    assert_eq!(picker.overlay().listener_count(), 0);
    assert_eq!(picker.overlay().marker_count(), 0);
    assert!(picker.highlights(&page).is_empty());
}

#[test]
fn test_secondary_click_excludes_exactly_one_match() {
    let page = quiz_page();
    let mut picker = Picker::default();
    picker.activate();
    picker.click(&page, QUESTION.0, QUESTION.1);

    let outcome = picker.click(&page, FIRST_ANSWER.0, FIRST_ANSWER.1);
    let ClickOutcome::Captured { role: Role::Answer, match_count, .. } = outcome else {
        panic!("answer was not captured: {:?}", outcome);
    };
    assert_eq!(match_count, 6);

    let excluded = picker.handle_input(&page, &InputEvent::SecondaryClick { x: SECOND_ANSWER.0, y: SECOND_ANSWER.1 });
    assert_eq!(excluded, qa_rule_picker::picker::InputOutcome::Excluded(Some(Role::Answer)));

    let state = picker.state().unwrap();
    assert_eq!(state.answer.match_count(), 5);
    let second = page.query_all(".option")[1];
    assert!(!state.answer.matches.contains(&second));
    assert_eq!(picker.overlay().marker(second), None);

    // A later re-query of the same capture keeps it out
    picker.skip_correct();
    let preview = picker.preview(&page).unwrap();
    assert_eq!(preview.answer_count, 5);
    assert_eq!(picker.state().unwrap().answer.match_count(), 5);
    assert!(preview.groups[0].answers.iter().all(|a| a.node != second));
}

#[test]
fn test_exclusion_of_non_match_changes_nothing() {
    let page = quiz_page();
    let mut picker = Picker::default();
    picker.activate();
    picker.click(&page, QUESTION.0, QUESTION.1);

    // Answers are not question matches
    assert_eq!(picker.exclude_node(page.query_all(".option")[0]), None);
    assert_eq!(picker.state().unwrap().question.match_count(), 2);
}

#[test]
fn test_hover_highlight_is_reported_in_top_level_coordinates() {
    let page = quiz_page();
    let mut picker = Picker::default();
    picker.activate();

    let hovered = picker.handle_input(&page, &InputEvent::PointerMove { x: 100.0, y: 330.0 });
    let stems = page.query_all(".stem");
    assert_eq!(hovered, qa_rule_picker::picker::InputOutcome::Hovered(Some(stems[1])));

    let highlights = picker.highlights(&page);
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].bounding_box.map(|b| b.y), Some(310.0));
}

#[test]
fn test_controller_save_flow() {
    let page = quiz_page();
    let mut controller = Controller::default();

    assert_eq!(controller.handle(&page, Command::ActivateSelector), vec![Event::SelectorActivated]);
    for (x, y) in [QUESTION, FIRST_ANSWER] {
        let events = controller.handle(&page, Command::PickerInput { event: InputEvent::Click { x, y } });
        assert!(events.is_empty());
    }
    controller.handle(&page, Command::SkipCorrect);
    assert_eq!(controller.picker().step(), Step::Preview);

    let events = controller.handle(&page, Command::SaveRule);
    assert_eq!(events.len(), 3);
    match &events[0] {
        Event::RuleCreated { rule } => {
            assert_eq!(rule.question_selector, ".stem");
            assert_eq!(rule.answer_selector, ".option");
            assert_eq!(rule.correct_selector, None);
            assert_eq!(rule.url_pattern, "https://lms.example.com/unit/*/quiz");
            assert_eq!((rule.question_count, rule.answer_count), (2, 6));
        }
        other => panic!("expected RULE_CREATED, got {:?}", other),
    }
    assert_eq!(events[1], Event::TriggerSeedExtract { seed_text: "Question 1".into() });
    assert_eq!(events[2], Event::SelectorDeactivated);
    assert!(!controller.picker().is_active());
    assert!(controller.picker().overlay().is_clean());
}

#[test]
fn test_escape_through_controller() {
    let page = quiz_page();
    let mut controller = Controller::default();
    controller.handle(&page, Command::ActivateSelector);

    let events = controller.handle(&page, Command::PickerInput { event: InputEvent::Key { key: "Escape".into() } });
    assert_eq!(events, vec![Event::SelectorDeactivated]);
    assert_eq!(controller.picker().step(), Step::Idle);
}

#[test]
fn test_vector_rendered_slide_picks_accessible_layer() {
    // Drawn options with a hidden accessible mirror
    let mut slide = ElementNode::new("div").with_class("slide").with_bounding_box(0.0, 0.0, 800.0, 600.0);
    let mut layer = ElementNode::new("div").with_class("acc-shadow-dom").with_visibility(false);
    for i in 0..3 {
        let y = 100.0 + i as f64 * 80.0;
        slide.add_child(
            ElementNode::new("div")
                .with_class("slide-object")
                .with_attribute("data-model-id", format!("obj{}", i))
                .with_bounding_box(50.0, y, 400.0, 50.0)
                .with_child(
                    ElementNode::new("svg")
                        .with_bounding_box(50.0, y, 400.0, 50.0)
                        .with_child(ElementNode::new("path").with_bounding_box(50.0, y, 400.0, 50.0)),
                ),
        );
        layer.add_child(
            ElementNode::new("div")
                .with_attribute("id", format!("acc-obj{}", i))
                .with_class("acc-choice")
                .with_text(format!("Choice {}", i + 1))
                .with_visibility(false)
                .with_bounding_box(50.0, y, 400.0, 50.0),
        );
    }
    let root = ElementNode::new("body").with_bounding_box(0.0, 0.0, 800.0, 600.0).with_child(slide).with_child(layer);
    let page = Page::from_snapshot(&PageSnapshot { url: "https://lms.example.com/story.html".into(), title: String::new(), root });

    let mut picker = Picker::default();
    picker.activate();
    picker.select_node(&page, page.query_all(".slide-object")[0]);
    assert_eq!(picker.step(), Step::PickAnswer);

    let outcome = picker.click(&page, 100.0, 200.0);
    match outcome {
        ClickOutcome::Captured { role: Role::Answer, selector, match_count, .. } => {
            assert_eq!(selector.expression(), ".acc-choice");
            assert_eq!(match_count, 3);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let answer = picker.state().unwrap().answer.node.unwrap();
    assert_eq!(page.text(answer), "Choice 2");
}
