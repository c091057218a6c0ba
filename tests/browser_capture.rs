use qa_rule_picker::{BrowserSession, ExtractionRule, LaunchOptions, Page, Picker, ProximityEngine, Step};

const QUIZ_HTML: &str = "data:text/html,<html><body style='margin:0'>\
    <div class='item'><p class='question' style='height:30px'>What is 2+2?</p>\
    <label class='answer' style='display:block;height:30px'>3</label>\
    <label class='answer correct' style='display:block;height:30px'>4</label></div>\
    <div class='item'><p class='question' style='height:30px'>What is 3+3?</p>\
    <label class='answer' style='display:block;height:30px'>6</label>\
    <label class='answer' style='display:block;height:30px'>7</label></div>\
    </body></html>";

#[test]
#[ignore] // Requires Chrome to be installed
fn test_capture_snapshot() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    session.navigate(QUIZ_HTML).expect("Failed to navigate");
    std::thread::sleep(std::time::Duration::from_millis(500));

    let snapshot = session.capture_snapshot().expect("Failed to capture page");
    assert_eq!(snapshot.root.tag_name, "body");
    assert!(snapshot.root.count_elements() > 6);

    let page = Page::from_snapshot(&snapshot);
    assert_eq!(page.query_all(".question").len(), 2);
    assert!(page.bounding_box(page.query_all(".question")[0]).is_some());
}

#[test]
#[ignore]
fn test_replay_on_captured_page() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    session.navigate(QUIZ_HTML).expect("Failed to navigate");
    std::thread::sleep(std::time::Duration::from_millis(500));

    let page = session.capture_page().expect("Failed to capture page");
    let rule = ExtractionRule::new(".question", ".answer", None, page.url());
    let result = ProximityEngine::default().extract(&page, &rule).expect("Extraction failed");

    assert_eq!(result.groups.len(), 2);
    assert_eq!(result.answer_count, 4);
    assert_eq!(result.correct_count, 1);
}

#[test]
#[ignore]
fn test_pick_by_coordinates_on_captured_page() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    session.navigate(QUIZ_HTML).expect("Failed to navigate");
    std::thread::sleep(std::time::Duration::from_millis(500));

    let page = session.capture_page().expect("Failed to capture page");
    let question = page.absolute_box(page.query_all(".question")[0]).expect("question has a box");
    let answer = page.absolute_box(page.query_all(".answer")[0]).expect("answer has a box");

    let mut picker = Picker::default();
    picker.activate();
    picker.click(&page, question.center_x(), question.y + 5.0);
    picker.click(&page, answer.center_x(), answer.y + 5.0);
    assert_eq!(picker.step(), Step::PickCorrect);

    let rule = picker.save(&page).expect("Failed to save rule");
    assert_eq!(rule.question_selector, ".question");
    assert_eq!(rule.answer_selector, ".answer");
}

#[test]
#[ignore]
fn test_srcdoc_frame_is_captured() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    session
        .navigate("data:text/html,<html><body><p class='q'>Top</p><iframe srcdoc=\"<p class='q'>Inner</p>\"></iframe></body></html>")
        .expect("Failed to navigate");
    std::thread::sleep(std::time::Duration::from_millis(500));

    let page = session.capture_page().expect("Failed to capture page");
    assert_eq!(page.list_documents().len(), 2);
    let texts: Vec<String> = page.query_all(".q").into_iter().map(|n| page.text(n)).collect();
    assert_eq!(texts, vec!["Top".to_string(), "Inner".to_string()]);
}
