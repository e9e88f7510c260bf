// Act-and-verify actions, query normalization, cookies, and the
// string-keyed dispatch surface.

mod common;

use std::time::Duration;

use common::{adapter_for, adapter_with, ElementSpec, MockSession};
use selenese::{CommandInterceptor, CommandValue, EngineConfig, Error};

// ============================================================================
// click / check / type
// ============================================================================

#[tokio::test]
async fn click_uses_the_native_click_when_clickable() {
    common::init_tracing();
    let mock = MockSession::new();
    let button = mock.add_element(ElementSpec {
        tag: "button",
        css: vec!["#go"],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    adapter.click("css=#go").await.expect("click");
    assert!(mock.events().contains(&format!("click@{button}")));
}

#[tokio::test]
async fn click_falls_back_to_synthesized_events_when_occluded() {
    common::init_tracing();
    let mock = MockSession::new();
    let button = mock.add_element(ElementSpec {
        tag: "button",
        css: vec!["#go"],
        occluded: true,
        ..ElementSpec::default()
    });
    let config = EngineConfig {
        check_element_clickable: true,
        ..common::test_config()
    };
    let adapter = adapter_with(&mock, config).await;

    adapter.click("css=#go").await.expect("click");

    let events = mock.events();
    assert!(!events.contains(&format!("click@{button}")));
    for event in ["mousedown", "mouseup", "click"] {
        assert!(
            events.contains(&format!("event:{event}@{button}")),
            "missing {event} in {events:?}"
        );
    }
}

#[tokio::test]
async fn check_requires_a_checkable_input() {
    common::init_tracing();
    let mock = MockSession::new();
    mock.add_element(ElementSpec {
        tag: "div",
        css: vec!["#not-input"],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#text-input"],
        attrs: vec![("type", "text")],
        ..ElementSpec::default()
    });
    let checkbox = mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#agree"],
        attrs: vec![("type", "checkbox")],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    let err = adapter.check("css=#not-input").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "got: {err}");
    let err = adapter.check("css=#text-input").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    adapter.check("css=#agree").await.expect("check");
    assert!(mock.element_selected(checkbox));
    // already checked: a second check is a no-op
    adapter.check("css=#agree").await.expect("recheck");
    assert!(mock.element_selected(checkbox));

    adapter.uncheck("css=#agree").await.expect("uncheck");
    assert!(!mock.element_selected(checkbox));

    // radios cannot be unchecked
    mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#radio"],
        attrs: vec![("type", "radio")],
        ..ElementSpec::default()
    });
    let err = adapter.uncheck("css=#radio").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn type_clears_then_sends_keys() {
    common::init_tracing();
    let mock = MockSession::new();
    let input = mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#user"],
        attrs: vec![("type", "text"), ("value", "stale text")],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    adapter.type_text("css=#user", "alice").await.expect("type");

    let events = mock.events();
    assert!(events.contains(&format!("clear@{input}")));
    assert!(events.contains(&format!("keys@{input}:alice")));
    assert_eq!(mock.element_attr(input, "value").as_deref(), Some("alice"));
}

#[tokio::test]
async fn type_falls_back_to_key_events_for_invisible_elements() {
    common::init_tracing();
    let mock = MockSession::new();
    let input = mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#hidden"],
        displayed: false,
        attrs: vec![("type", "hidden")],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    adapter.type_text("css=#hidden", "ab").await.expect("type");

    let events = mock.events();
    // per character: keydown, keypress, keyup
    let key_events = events
        .iter()
        .filter(|e| e.starts_with("event:key") && e.ends_with(&format!("@{input}")))
        .count();
    assert_eq!(key_events, 6, "events: {events:?}");
    // the value property is kept in sync for hidden inputs
    assert_eq!(mock.element_attr(input, "value").as_deref(), Some("ab"));
}

// ============================================================================
// getText / getValue / attributes
// ============================================================================

#[tokio::test]
async fn get_text_normalization_rules() {
    common::init_tracing();
    let mock = MockSession::new();
    mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#cb"],
        attrs: vec![("type", "checkbox"), ("value", "yes")],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#field"],
        attrs: vec![("type", "text"), ("value", "typed")],
        text: "ignored",
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "textarea",
        css: vec!["#notes"],
        attrs: vec![("value", "note text")],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "p",
        css: vec!["#para"],
        text: "paragraph",
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "p",
        css: vec!["#invisible"],
        text: "you cannot see me",
        displayed: false,
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    assert_eq!(adapter.get_text("css=#cb").await.expect("cb"), "");
    assert_eq!(adapter.get_text("css=#field").await.expect("field"), "typed");
    assert_eq!(adapter.get_text("css=#notes").await.expect("notes"), "note text");
    assert_eq!(adapter.get_text("css=#para").await.expect("para"), "paragraph");
    assert_eq!(adapter.get_text("css=#invisible").await.expect("invisible"), "");

    assert_eq!(adapter.get_value("css=#cb").await.expect("value"), "yes");
}

#[tokio::test]
async fn attribute_queries() {
    common::init_tracing();
    let mock = MockSession::new();
    mock.add_element(ElementSpec {
        tag: "a",
        css: vec!["#home"],
        attrs: vec![("id", "home"), ("href", "/index.html"), ("class", "nav")],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    assert_eq!(
        adapter.get_attribute("id=home@href").await.expect("href"),
        "/index.html"
    );
    assert_eq!(
        adapter
            .get_element_attribute("css=#home", "class")
            .await
            .expect("class"),
        "nav"
    );

    let err = adapter.get_attribute("id=home@missing").await.unwrap_err();
    assert!(matches!(err, Error::NoSuchElement(_)), "got: {err}");
}

#[tokio::test]
async fn counts_and_page_text() {
    common::init_tracing();
    let mock = MockSession::new();
    mock.add_element(ElementSpec {
        tag: "body",
        text: "all the visible text",
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        css: vec![".card"],
        xpaths: vec!["//div[@class='card']"],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        css: vec![".card"],
        xpaths: vec!["//div[@class='card']"],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    assert_eq!(adapter.get_element_count("css=.card").await.expect("count"), 2);
    assert_eq!(adapter.get_element_count("css=.gone").await.expect("count"), 0);
    assert_eq!(
        adapter
            .get_xpath_count("//div[@class='card']")
            .await
            .expect("xpath count"),
        2
    );
    assert_eq!(
        adapter.get_page_text().await.expect("page text"),
        "all the visible text"
    );
    assert!(adapter.is_text_present("visible").await.expect("probe"));
    assert!(!adapter.is_text_present("absent words").await.expect("probe"));
}

// ============================================================================
// select / multi-select
// ============================================================================

#[tokio::test]
async fn select_replaces_the_selection_on_single_selects() {
    common::init_tracing();
    let mock = MockSession::new();
    let select = mock.add_element(ElementSpec {
        tag: "select",
        css: vec!["#color"],
        ..ElementSpec::default()
    });
    let red = mock.add_element(ElementSpec {
        tag: "option",
        text: "Red",
        parent: Some(select),
        attrs: vec![("value", "red")],
        selected: true,
        ..ElementSpec::default()
    });
    let blue = mock.add_element(ElementSpec {
        tag: "option",
        text: "Blue",
        parent: Some(select),
        attrs: vec![("value", "blue")],
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    adapter.select("css=#color", "value=blue").await.expect("select");
    assert!(mock.element_selected(blue));
    assert!(!mock.element_selected(red));

    assert_eq!(
        adapter.get_selected_values("css=#color").await.expect("values"),
        vec!["blue".to_string()]
    );
    assert_eq!(
        adapter.get_selected_labels("css=#color").await.expect("labels"),
        vec!["Blue".to_string()]
    );
    assert_eq!(
        adapter.get_selected_indices("css=#color").await.expect("indices"),
        vec![1]
    );
}

#[tokio::test]
async fn add_and_remove_selection_require_a_multi_select() {
    common::init_tracing();
    let mock = MockSession::new();
    let single = mock.add_element(ElementSpec {
        tag: "select",
        css: vec!["#single"],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "option",
        text: "One",
        parent: Some(single),
        ..ElementSpec::default()
    });
    let multi = mock.add_element(ElementSpec {
        tag: "select",
        css: vec!["#multi"],
        attrs: vec![("multiple", "multiple")],
        ..ElementSpec::default()
    });
    let a = mock.add_element(ElementSpec {
        tag: "option",
        text: "Alpha",
        parent: Some(multi),
        ..ElementSpec::default()
    });
    let b = mock.add_element(ElementSpec {
        tag: "option",
        text: "Beta",
        parent: Some(multi),
        ..ElementSpec::default()
    });
    let adapter = adapter_for(&mock).await;

    let err = adapter.add_selection("css=#single", "One").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    adapter.add_selection("css=#multi", "Alpha").await.expect("add");
    adapter.add_selection("css=#multi", "Beta").await.expect("add");
    assert!(mock.element_selected(a) && mock.element_selected(b));

    adapter
        .remove_selection("css=#multi", "Alpha")
        .await
        .expect("remove");
    assert!(!mock.element_selected(a) && mock.element_selected(b));
}

// ============================================================================
// cookies, open, timeout propagation
// ============================================================================

#[tokio::test]
async fn create_cookie_parses_options() {
    common::init_tracing();
    let mock = MockSession::new();
    let adapter = adapter_for(&mock).await;

    adapter
        .create_cookie("session=abc123", "max_age=120, path=http://host/dir")
        .await
        .expect("cookie");

    let cookies = mock.cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "session");
    assert_eq!(cookies[0].value, "abc123");
    assert_eq!(cookies[0].path.as_deref(), Some("/dir"));
    assert_eq!(cookies[0].max_age, Some(Duration::from_secs(120)));

    let err = adapter.create_cookie("not a pair", "").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    adapter.delete_cookie("session").await.expect("delete");
    assert!(mock.cookies().is_empty());
}

#[tokio::test]
async fn open_resolves_against_the_base_url() {
    common::init_tracing();
    let mock = MockSession::new();
    let config = EngineConfig {
        base_url: Some("https://example.test/app/".parse().expect("url")),
        ..common::test_config()
    };
    let adapter = adapter_with(&mock, config).await;

    adapter.open("login?next=home").await.expect("open");
    assert_eq!(
        mock.navigations(),
        vec!["https://example.test/app/login?next=home".to_string()]
    );
}

#[tokio::test]
async fn set_timeout_propagates_to_the_session() {
    common::init_tracing();
    let mock = MockSession::new();
    let adapter = adapter_for(&mock).await;

    adapter
        .set_timeout(Duration::from_secs(7))
        .await
        .expect("set timeout");
    assert_eq!(adapter.timeout(), Duration::from_secs(7));

    // construction applies the default; the explicit call adds another
    let recorded = mock.page_load_timeouts();
    assert_eq!(recorded.last().copied(), Some(Duration::from_secs(7)));
    assert_eq!(mock.script_timeouts().last().copied(), Some(Duration::from_secs(7)));
}

#[tokio::test]
async fn timeout_propagation_can_be_disabled() {
    common::init_tracing();
    let mock = MockSession::new();
    let config = EngineConfig {
        set_timeouts_at_session: false,
        ..common::test_config()
    };
    let adapter = adapter_with(&mock, config).await;

    adapter
        .set_timeout(Duration::from_secs(9))
        .await
        .expect("set timeout");
    assert!(mock.page_load_timeouts().is_empty());
    assert_eq!(adapter.timeout(), Duration::from_secs(9));
}

// ============================================================================
// string-keyed dispatch
// ============================================================================

#[tokio::test]
async fn execute_dispatches_by_name_and_returns_typed_values() {
    common::init_tracing();
    let mock = MockSession::new();
    mock.add_element(ElementSpec {
        tag: "h1",
        text: "Welcome",
        css: vec!["#title"],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "input",
        css: vec!["#agree"],
        attrs: vec![("type", "checkbox")],
        selected: true,
        ..ElementSpec::default()
    });
    let commands = CommandInterceptor::new(adapter_for(&mock).await);

    let text = commands
        .execute("getText", Some("css=#title"), None)
        .await
        .expect("getText");
    assert_eq!(text, Some(CommandValue::Text("Welcome".to_string())));

    let checked = commands
        .execute("isChecked", Some("css=#agree"), None)
        .await
        .expect("isChecked");
    assert_eq!(checked, Some(CommandValue::Flag(true)));

    let title = commands
        .execute("getTitle", None, None)
        .await
        .expect("getTitle");
    assert_eq!(title, Some(CommandValue::Text("Main Page".to_string())));

    // void commands return no value
    let clicked = commands
        .execute("click", Some("css=#agree"), None)
        .await
        .expect("click");
    assert_eq!(clicked, None);
}

#[tokio::test]
async fn execute_rejects_unknown_commands_and_bad_arguments() {
    common::init_tracing();
    let mock = MockSession::new();
    let commands = CommandInterceptor::new(adapter_for(&mock).await);

    let err = commands.execute("frobnicate", None, None).await.unwrap_err();
    assert!(matches!(err, Error::UnknownCommand(_)), "got: {err}");

    let err = commands
        .execute("waitForElementCount", Some("css=.x"), Some("many"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "got: {err}");

    // the missing-argument failure is raised inside the invocation, so
    // it arrives wrapped in command context
    let err = commands.execute("click", None, None).await.unwrap_err();
    assert!(matches!(err.root(), Error::InvalidArgument(_)), "got: {err}");
    assert!(err.to_string().contains("Command failed: click"));
}

#[tokio::test]
async fn execute_returns_selected_lists() {
    common::init_tracing();
    let mock = MockSession::new();
    let select = mock.add_element(ElementSpec {
        tag: "select",
        css: vec!["#color"],
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "option",
        text: "Red",
        parent: Some(select),
        attrs: vec![("value", "red"), ("id", "opt-red")],
        selected: true,
        ..ElementSpec::default()
    });
    mock.add_element(ElementSpec {
        tag: "option",
        text: "Blue",
        parent: Some(select),
        attrs: vec![("value", "blue"), ("id", "opt-blue")],
        selected: true,
        ..ElementSpec::default()
    });
    let commands = CommandInterceptor::new(adapter_for(&mock).await);

    let values = commands
        .execute("getSelectedValues", Some("css=#color"), None)
        .await
        .expect("values");
    assert_eq!(
        values,
        Some(CommandValue::List(vec![
            "red".to_string(),
            "blue".to_string()
        ]))
    );

    let indexes = commands
        .execute("getSelectedIndexes", Some("css=#color"), None)
        .await
        .expect("indexes");
    assert_eq!(
        indexes,
        Some(CommandValue::List(vec!["0".to_string(), "1".to_string()]))
    );
}
