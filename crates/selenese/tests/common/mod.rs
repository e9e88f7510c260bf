// Shared test infrastructure: an in-memory fake of the session
// capability. Elements are registered with the selectors they answer
// to; script execution is dispatched on recognizable snippets and either
// answers from configured tables or records the effect in an event log.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use selenese::{
    By, Capabilities, CommandAdapter, Cookie, Element, ElementRef, EngineConfig, Error,
    FrameTarget, Result, ScriptArg, ScriptValue, Session, WindowHandle,
};

pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Short timeouts and a fast poll interval, so waits in tests resolve
/// quickly.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        default_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(10),
        ..EngineConfig::default()
    }
}

pub async fn adapter_for(mock: &MockSession) -> CommandAdapter {
    CommandAdapter::new(mock.as_session(), test_config())
        .await
        .expect("adapter construction")
}

pub async fn adapter_with(mock: &MockSession, config: EngineConfig) -> CommandAdapter {
    CommandAdapter::new(mock.as_session(), config)
        .await
        .expect("adapter construction")
}

/// Declarative description of a fake DOM element.
pub struct ElementSpec {
    pub tag: &'static str,
    pub text: &'static str,
    pub displayed: bool,
    pub enabled: bool,
    pub selected: bool,
    /// Another element would receive a click at this element's center.
    pub occluded: bool,
    /// Index of the parent element (options point at their select).
    pub parent: Option<usize>,
    pub attrs: Vec<(&'static str, &'static str)>,
    /// CSS selectors this element answers to.
    pub css: Vec<&'static str>,
    /// Additional xpath expressions this element answers to (id/name
    /// xpaths are derived automatically from the attributes).
    pub xpaths: Vec<&'static str>,
    /// Computed style properties.
    pub styles: Vec<(&'static str, &'static str)>,
}

impl Default for ElementSpec {
    fn default() -> Self {
        Self {
            tag: "div",
            text: "",
            displayed: true,
            enabled: true,
            selected: false,
            occluded: false,
            parent: None,
            attrs: Vec::new(),
            css: Vec::new(),
            xpaths: Vec::new(),
            styles: Vec::new(),
        }
    }
}

struct ElementState {
    tag: String,
    text: String,
    displayed: bool,
    enabled: bool,
    selected: bool,
    occluded: bool,
    stale: bool,
    parent: Option<usize>,
    attrs: HashMap<String, String>,
    css_keys: Vec<String>,
    xpath_keys: Vec<String>,
    styles: HashMap<String, String>,
}

struct WindowState {
    handle: String,
    name: String,
    title: String,
}

#[derive(Default)]
struct State {
    elements: Vec<ElementState>,
    windows: Vec<WindowState>,
    current_window: Option<usize>,
    events: Vec<String>,
    navigations: Vec<String>,
    cookies: Vec<Cookie>,
    page_load_timeouts: Vec<Duration>,
    script_timeouts: Vec<Duration>,
    capabilities: Capabilities,
    scriptable: bool,
    /// Successive answers of the page-load sentinel script; when
    /// exhausted, the last answer repeats (empty means "never loaded").
    load_sentinel: Vec<bool>,
    load_sentinel_calls: usize,
    sentinel_drops: usize,
    eval_results: HashMap<String, String>,
    dom_results: HashMap<String, usize>,
    at_top: bool,
    parent_name_path: String,
    parent_index_path: String,
    /// While positive, find_elements fails with StaleElement and counts
    /// down.
    stale_find_failures: u32,
    /// Makes navigate fail with a page-load timeout.
    navigate_times_out: bool,
}

#[derive(Clone)]
pub struct MockSession {
    state: Arc<Mutex<State>>,
}

impl MockSession {
    /// A session with a single window (`main` / title "Main Page") and
    /// an empty document.
    pub fn new() -> Self {
        let mut state = State {
            scriptable: true,
            at_top: true,
            ..State::default()
        };
        state.windows.push(WindowState {
            handle: "win-main".to_string(),
            name: "main".to_string(),
            title: "Main Page".to_string(),
        });
        state.current_window = Some(0);

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn as_session(&self) -> Arc<dyn Session> {
        Arc::new(self.clone())
    }

    pub fn add_element(&self, spec: ElementSpec) -> usize {
        let mut state = self.state.lock().unwrap();
        state.elements.push(ElementState {
            tag: spec.tag.to_string(),
            text: spec.text.to_string(),
            displayed: spec.displayed,
            enabled: spec.enabled,
            selected: spec.selected,
            occluded: spec.occluded,
            stale: false,
            parent: spec.parent,
            attrs: spec
                .attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            css_keys: spec.css.iter().map(|s| s.to_string()).collect(),
            xpath_keys: spec.xpaths.iter().map(|s| s.to_string()).collect(),
            styles: spec
                .styles
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        state.elements.len() - 1
    }

    pub fn add_window(&self, handle: &str, name: &str, title: &str) {
        let mut state = self.state.lock().unwrap();
        state.windows.push(WindowState {
            handle: handle.to_string(),
            name: name.to_string(),
            title: title.to_string(),
        });
    }

    pub fn close_current_window(&self) {
        self.state.lock().unwrap().current_window = None;
    }

    pub fn set_page_load_strategy(&self, strategy: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .capabilities
            .0
            .insert("pageLoadStrategy".to_string(), json!(strategy));
    }

    pub fn set_scriptable(&self, scriptable: bool) {
        self.state.lock().unwrap().scriptable = scriptable;
    }

    pub fn set_load_sentinel(&self, answers: Vec<bool>) {
        let mut state = self.state.lock().unwrap();
        state.load_sentinel = answers;
        state.load_sentinel_calls = 0;
    }

    pub fn set_eval_result(&self, expression: &str, result: &str) {
        self.state
            .lock()
            .unwrap()
            .eval_results
            .insert(expression.to_string(), result.to_string());
    }

    pub fn set_dom_result(&self, expression: &str, element: usize) {
        self.state
            .lock()
            .unwrap()
            .dom_results
            .insert(format!("return {expression}"), element);
    }

    pub fn set_at_top(&self, at_top: bool) {
        self.state.lock().unwrap().at_top = at_top;
    }

    pub fn set_parent_paths(&self, name_path: &str, index_path: &str) {
        let mut state = self.state.lock().unwrap();
        state.parent_name_path = name_path.to_string();
        state.parent_index_path = index_path.to_string();
    }

    pub fn fail_finds_with_stale(&self, failures: u32) {
        self.state.lock().unwrap().stale_find_failures = failures;
    }

    pub fn make_navigate_time_out(&self, times_out: bool) {
        self.state.lock().unwrap().navigate_times_out = times_out;
    }

    pub fn set_text(&self, element: usize, text: &str) {
        self.state.lock().unwrap().elements[element].text = text.to_string();
    }

    pub fn set_attr(&self, element: usize, name: &str, value: &str) {
        self.state.lock().unwrap().elements[element]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_displayed(&self, element: usize, displayed: bool) {
        self.state.lock().unwrap().elements[element].displayed = displayed;
    }

    pub fn set_selected(&self, element: usize, selected: bool) {
        self.state.lock().unwrap().elements[element].selected = selected;
    }

    pub fn set_stale(&self, element: usize, stale: bool) {
        self.state.lock().unwrap().elements[element].stale = stale;
    }

    pub fn remove_element(&self, element: usize) {
        let mut state = self.state.lock().unwrap();
        state.elements[element].stale = true;
        state.elements[element].css_keys.clear();
        state.elements[element].xpath_keys.clear();
        state.elements[element].attrs.remove("id");
        state.elements[element].attrs.remove("name");
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        self.state.lock().unwrap().cookies.clone()
    }

    pub fn sentinel_drops(&self) -> usize {
        self.state.lock().unwrap().sentinel_drops
    }

    pub fn element_selected(&self, element: usize) -> bool {
        self.state.lock().unwrap().elements[element].selected
    }

    pub fn element_attr(&self, element: usize, name: &str) -> Option<String> {
        self.state.lock().unwrap().elements[element]
            .attrs
            .get(name)
            .cloned()
    }

    pub fn page_load_timeouts(&self) -> Vec<Duration> {
        self.state.lock().unwrap().page_load_timeouts.clone()
    }

    pub fn script_timeouts(&self) -> Vec<Duration> {
        self.state.lock().unwrap().script_timeouts.clone()
    }

    fn element_ref(&self, index: usize) -> ElementRef {
        Arc::new(MockElement {
            state: Arc::clone(&self.state),
            index,
        })
    }

    fn matching_elements(&self, by: &By) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| !el.stale && element_matches(el, by))
            .map(|(idx, _)| idx)
            .collect()
    }
}

fn element_matches(el: &ElementState, by: &By) -> bool {
    match by {
        By::Css(selector) => el.css_keys.iter().any(|key| key == selector),
        By::XPath(xpath) => {
            if el.xpath_keys.iter().any(|key| key == xpath) {
                return true;
            }
            if let Some(id) = el.attrs.get("id") {
                if *xpath == format!("//*[@id='{id}']") {
                    return true;
                }
            }
            if let Some(name) = el.attrs.get("name") {
                if *xpath == format!("//*[@name='{name}']") {
                    return true;
                }
            }
            false
        }
        By::TagName(tag) => el.tag == *tag,
    }
}

/// Event types recognized in synthesized-event scripts; longer names
/// first so `dblclick` is not reported as `click`.
const EVENT_TYPES: &[&str] = &[
    "contextmenu",
    "mousedown",
    "mousemove",
    "mouseover",
    "mouseout",
    "mouseup",
    "dblclick",
    "keypress",
    "keydown",
    "keyup",
    "change",
    "click",
];

#[async_trait]
impl Session for MockSession {
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementRef>> {
        {
            let mut state = self.state.lock().unwrap();
            if state.stale_find_failures > 0 {
                state.stale_find_failures -= 1;
                return Err(Error::StaleElement("injected staleness".to_string()));
            }
        }
        Ok(self
            .matching_elements(by)
            .into_iter()
            .map(|idx| self.element_ref(idx))
            .collect())
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<ScriptValue> {
        let mut state = self.state.lock().unwrap();
        if !state.scriptable {
            return Err(Error::UnsupportedOperation(
                "mock session is not scriptable".to_string(),
            ));
        }

        // dom= strategy expressions
        if let Some(&element) = state.dom_results.get(script) {
            drop(state);
            return Ok(ScriptValue::Element(self.element_ref(element)));
        }

        if script.contains("delete window.__loadSentinel") {
            state.sentinel_drops += 1;
            return Ok(ScriptValue::Null);
        }
        if script.contains("__loadSentinel") {
            let call = state.load_sentinel_calls;
            state.load_sentinel_calls += 1;
            let answer = state
                .load_sentinel
                .get(call)
                .or(state.load_sentinel.last())
                .copied()
                .unwrap_or(false);
            return Ok(ScriptValue::Bool(answer));
        }
        if script == "return window.name" {
            let name = state
                .current_window
                .map(|idx| state.windows[idx].name.clone())
                .ok_or_else(|| Error::NoSuchWindow("current window closed".to_string()))?;
            return Ok(ScriptValue::String(name));
        }
        if script.contains("eval(arguments[0])") {
            let expression = match args.first() {
                Some(ScriptArg::Value(value)) => value.as_str().unwrap_or_default().to_string(),
                _ => String::new(),
            };
            let result = state
                .eval_results
                .get(&expression)
                .cloned()
                .unwrap_or_else(|| "null".to_string());
            return Ok(ScriptValue::String(result));
        }
        if script.contains("window.parent === window.top") {
            return Ok(ScriptValue::Bool(state.at_top));
        }
        if script.contains("names.unshift") {
            return Ok(ScriptValue::String(state.parent_name_path.clone()));
        }
        if script.contains("indexes.unshift") {
            return Ok(ScriptValue::String(state.parent_index_path.clone()));
        }
        if script.contains("elementFromPoint") {
            let element = script_arg_element(&args, 0)?;
            return Ok(ScriptValue::Bool(!state.elements[element].occluded));
        }
        if script.contains("getComputedStyle") {
            let element = script_arg_element(&args, 0)?;
            let property = match args.get(1) {
                Some(ScriptArg::Value(value)) => value.as_str().unwrap_or_default(),
                _ => "",
            };
            return Ok(match state.elements[element].styles.get(property) {
                Some(value) => ScriptValue::String(value.clone()),
                None => ScriptValue::Null,
            });
        }
        if script.contains("window.alert") {
            state.events.push("neutralize-dialogs".to_string());
            return Ok(ScriptValue::Null);
        }
        if script.contains("selectedIndex = arguments[1]") {
            let select = script_arg_element(&args, 0)?;
            let option = script_arg_element(&args, 1)?;
            select_option(&mut state, select, option);
            state
                .events
                .push(format!("script-select:{select}:{option}"));
            return Ok(ScriptValue::Null);
        }
        if let Some(rest) = script.strip_prefix("arguments[0].") {
            if let Some((name, value)) = rest.split_once('=') {
                let element = script_arg_element(&args, 0)?;
                let value = value.trim_end_matches(';');
                apply_property(&mut state, element, name, value);
                state
                    .events
                    .push(format!("script-set:{name}@{element}"));
                return Ok(ScriptValue::Null);
            }
        }
        if script.contains("dispatchEvent") {
            let element = script_arg_element(&args, 0)?;
            let event_type = EVENT_TYPES
                .iter()
                .find(|t| script.contains(&format!("'{t}'")))
                .copied()
                .unwrap_or("unknown");
            state.events.push(format!("event:{event_type}@{element}"));
            return Ok(ScriptValue::Null);
        }

        Ok(ScriptValue::Null)
    }

    async fn current_window_handle(&self) -> Result<WindowHandle> {
        let state = self.state.lock().unwrap();
        state
            .current_window
            .map(|idx| WindowHandle(state.windows[idx].handle.clone()))
            .ok_or_else(|| Error::NoSuchWindow("current window closed".to_string()))
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .windows
            .iter()
            .map(|w| WindowHandle(w.handle.clone()))
            .collect())
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.windows.iter().position(|w| w.handle == handle.0) {
            Some(idx) => {
                state.current_window = Some(idx);
                state.events.push(format!("switch-window:{}", handle.0));
                Ok(())
            }
            None => Err(Error::NoSuchWindow(handle.0.clone())),
        }
    }

    async fn switch_to_frame(&self, target: FrameTarget) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let description = match target {
            FrameTarget::Index(idx) => format!("index:{idx}"),
            FrameTarget::Name(name) => format!("name:{name}"),
            FrameTarget::Element(_) => "element".to_string(),
        };
        state.events.push(format!("switch-frame:{description}"));
        Ok(())
    }

    async fn switch_to_default_content(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push("switch-default-content".to_string());
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if state.navigate_times_out {
            return Err(Error::PageLoadTimeout(format!("navigation to {url}")));
        }
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .current_window
            .map(|idx| state.windows[idx].title.clone())
            .ok_or_else(|| Error::NoSuchWindow("current window closed".to_string()))
    }

    fn capabilities(&self) -> Capabilities {
        self.state.lock().unwrap().capabilities.clone()
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.state.lock().unwrap().page_load_timeouts.push(timeout);
        Ok(())
    }

    async fn set_script_timeout(&self, timeout: Duration) -> Result<()> {
        self.state.lock().unwrap().script_timeouts.push(timeout);
        Ok(())
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        self.state.lock().unwrap().cookies.push(cookie);
        Ok(())
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.state.lock().unwrap().cookies.retain(|c| c.name != name);
        Ok(())
    }

    async fn delete_all_cookies(&self) -> Result<()> {
        self.state.lock().unwrap().cookies.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push("close".to_string());
        Ok(())
    }
}

fn script_arg_element(args: &[ScriptArg], index: usize) -> Result<usize> {
    match args.get(index) {
        Some(ScriptArg::Element(element)) => {
            let mock = element
                .as_any()
                .downcast_ref::<MockElement>()
                .ok_or_else(|| Error::Session("foreign element reference".to_string()))?;
            Ok(mock.index)
        }
        _ => Err(Error::Session(format!("missing element argument {index}"))),
    }
}

fn apply_property(state: &mut State, element: usize, name: &str, value: &str) {
    match name {
        "checked" | "selected" => {
            state.elements[element].selected = value == "true";
        }
        "value" => {
            let text: String = serde_json::from_str(value).unwrap_or_default();
            state.elements[element]
                .attrs
                .insert("value".to_string(), text);
        }
        _ => {}
    }
}

/// Selects the option and deselects its siblings unless the select is a
/// multi-select.
fn select_option(state: &mut State, select: usize, option: usize) {
    let multiple = state.elements[select]
        .attrs
        .get("multiple")
        .is_some_and(|v| v != "false");
    if !multiple {
        let siblings: Vec<usize> = state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.parent == Some(select))
            .map(|(idx, _)| idx)
            .collect();
        for sibling in siblings {
            state.elements[sibling].selected = false;
        }
    }
    state.elements[option].selected = true;
}

pub struct MockElement {
    state: Arc<Mutex<State>>,
    index: usize,
}

impl std::fmt::Debug for MockElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockElement")
            .field("index", &self.index)
            .finish()
    }
}

impl MockElement {
    fn with_state<T>(&self, f: impl FnOnce(&mut State, usize) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        if state.elements[self.index].stale {
            return Err(Error::StaleElement(format!("element {}", self.index)));
        }
        Ok(f(&mut state, self.index))
    }
}

#[async_trait]
impl Element for MockElement {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn tag_name(&self) -> Result<String> {
        self.with_state(|state, idx| state.elements[idx].tag.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.with_state(|state, idx| state.elements[idx].attrs.get(name).cloned())
    }

    async fn text(&self) -> Result<String> {
        self.with_state(|state, idx| state.elements[idx].text.clone())
    }

    async fn is_displayed(&self) -> Result<bool> {
        self.with_state(|state, idx| state.elements[idx].displayed)
    }

    async fn is_enabled(&self) -> Result<bool> {
        self.with_state(|state, idx| state.elements[idx].enabled)
    }

    async fn is_selected(&self) -> Result<bool> {
        self.with_state(|state, idx| state.elements[idx].selected)
    }

    async fn click(&self) -> Result<()> {
        self.with_state(|state, idx| {
            state.events.push(format!("click@{idx}"));

            let tag = state.elements[idx].tag.clone();
            if tag == "input" {
                match state.elements[idx].attrs.get("type").map(String::as_str) {
                    Some("checkbox") => {
                        state.elements[idx].selected = !state.elements[idx].selected;
                    }
                    Some("radio") => state.elements[idx].selected = true,
                    _ => {}
                }
            } else if tag == "option" {
                if let Some(select) = state.elements[idx].parent {
                    let multiple = state.elements[select]
                        .attrs
                        .get("multiple")
                        .is_some_and(|v| v != "false");
                    if multiple {
                        // modeled as a ctrl-click: toggles this option only
                        state.elements[idx].selected = !state.elements[idx].selected;
                    } else {
                        select_option(state, select, idx);
                    }
                }
            }
        })
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.with_state(|state, idx| {
            state.events.push(format!("keys@{idx}:{text}"));

            let tag = state.elements[idx].tag.clone();
            if tag == "input" || tag == "textarea" {
                let current = state.elements[idx]
                    .attrs
                    .get("value")
                    .cloned()
                    .unwrap_or_default();
                state.elements[idx]
                    .attrs
                    .insert("value".to_string(), format!("{current}{text}"));
            }
        })
    }

    async fn clear(&self) -> Result<()> {
        self.with_state(|state, idx| {
            state.events.push(format!("clear@{idx}"));
            state.elements[idx]
                .attrs
                .insert("value".to_string(), String::new());
        })
    }

    async fn submit(&self) -> Result<()> {
        self.with_state(|state, idx| state.events.push(format!("submit@{idx}")))
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<ElementRef>> {
        let children = self.with_state(|state, idx| {
            state
                .elements
                .iter()
                .enumerate()
                .filter(|(_, el)| el.parent == Some(idx) && !el.stale && element_matches(el, by))
                .map(|(child, _)| child)
                .collect::<Vec<_>>()
        })?;

        Ok(children
            .into_iter()
            .map(|child| {
                Arc::new(MockElement {
                    state: Arc::clone(&self.state),
                    index: child,
                }) as ElementRef
            })
            .collect())
    }
}
