// Script-backed element helpers
//
// Everything the session capability cannot answer directly is asked via
// injected JavaScript: synthesized DOM events for elements that cannot
// be interacted with natively, effective style computation, the click
// occlusion probe, and the expression evaluator. Sessions that cannot
// execute script make the `*_if_possible` variants no-ops.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::session::{Element, ElementRef, ScriptArg, ScriptValue, Session};

/// Wrapper used by the `evaluate` command: evaluates an arbitrary
/// expression and stringifies the result.
pub(crate) const EVAL_SCRIPT: &str = "var r = null; \
try { r = eval(arguments[0]); } catch (e) { throw new Error(String(e)) } \
return String(r)";

/// Replaces `window.alert()` and `window.confirm()` with non-interactive
/// versions that assume OK was pressed, and disarms `onbeforeunload`.
const NEUTRALIZE_DIALOGS_SCRIPT: &str = "window.alert = function (msg) {}; \
window.confirm = function (msg) { return true; }; \
window.onbeforeunload = function (e) {};";

const OCCLUSION_SCRIPT: &str = "var e = arguments[0], rect = e && e.getBoundingClientRect(); \
try { \
  return e.ownerDocument.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2) === e; \
} catch (ex) { return false }";

const EFFECTIVE_STYLE_SCRIPT: &str = "\
function getStyle(element, style) {\n\
  var value = element.style && element.style[style];\n\
  if (!value) {\n\
    var doc = element.ownerDocument;\n\
    if (doc && doc.defaultView && doc.defaultView.getComputedStyle) {\n\
      var css = doc.defaultView.getComputedStyle(element, null);\n\
      value = css ? css.getPropertyValue(style) : null;\n\
    }\n\
  }\n\
  return value == 'auto' ? null : value;\n\
}\n\
function getEffectiveStyle(element, style) {\n\
  var effectiveStyle = getStyle(element, style);\n\
  if ('inherit' === effectiveStyle && element.parentNode) {\n\
    return getEffectiveStyle(element.parentNode, style);\n\
  }\n\
  return effectiveStyle;\n\
}\n\
return getEffectiveStyle(arguments[0], arguments[1])";

/// Executes a script, returning `None` when the session is not
/// script-capable instead of failing.
pub(crate) async fn execute_script_if_possible(
    session: &dyn Session,
    script: &str,
    args: Vec<ScriptArg>,
) -> Result<Option<ScriptValue>> {
    match session.execute_script(script, args).await {
        Ok(value) => Ok(Some(value)),
        Err(err) if matches!(err.root(), Error::UnsupportedOperation(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Best-effort dialog neutralization before interactions that may pop
/// alerts or confirms.
pub(crate) async fn neutralize_dialogs(session: &dyn Session) -> Result<()> {
    execute_script_if_possible(session, NEUTRALIZE_DIALOGS_SCRIPT, Vec::new()).await?;
    Ok(())
}

/// Produces a JavaScript string literal for splicing text into a script.
pub(crate) fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Assigns a raw JavaScript value to an element property, e.g.
/// `set_property(.., "checked", "true")`.
pub(crate) async fn set_property(
    session: &dyn Session,
    element: &ElementRef,
    name: &str,
    js_value: &str,
) -> Result<()> {
    let script = format!("arguments[0].{name}={js_value};");
    execute_script_if_possible(session, &script, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(())
}

/// Fires a full synthesized click sequence: mousedown, mouseup, click.
pub(crate) async fn fire_click_event(session: &dyn Session, element: &ElementRef) -> Result<()> {
    fire_mouse_event(session, element, "mousedown", None).await?;
    fire_mouse_event(session, element, "mouseup", None).await?;
    fire_mouse_event(session, element, "click", None).await
}

/// Fires a single synthesized mouse event, optionally at client
/// coordinates.
pub(crate) async fn fire_mouse_event(
    session: &dyn Session,
    element: &ElementRef,
    event_type: &str,
    coordinates: Option<(i32, i32)>,
) -> Result<()> {
    let (x, y) = coordinates.unwrap_or((0, 0));
    let script = format!(
        "var doc = arguments[0].ownerDocument;\n\
         if (doc) {{\n\
           var event;\n\
           try {{\n\
             event = doc.createEvent('MouseEvents');\n\
             event.initMouseEvent('{event_type}', true, true, doc.defaultView, 0, 0, 0, {x}, {y}, false, false, false, false, 0, null);\n\
           }} catch (e) {{\n\
             event = new MouseEvent('{event_type}', {{ bubbles: true, cancelable: true, view: doc.defaultView, clientX: {x}, clientY: {y} }});\n\
           }}\n\
           arguments[0].dispatchEvent(event);\n\
         }}"
    );
    session
        .execute_script(&script, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(())
}

/// Fires a synthesized change event at the element.
pub(crate) async fn fire_change_event(session: &dyn Session, element: &ElementRef) -> Result<()> {
    let script = "var doc = arguments[0].ownerDocument;\n\
        if (doc) {\n\
          var changeEvent = doc.createEvent('HTMLEvents');\n\
          changeEvent.initEvent('change', true, true);\n\
          arguments[0].dispatchEvent(changeEvent);\n\
        }";
    execute_script_if_possible(session, script, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(())
}

/// Fires a synthesized key event (`keydown`, `keypress`, `keyup`) with
/// the given character code.
pub(crate) async fn fire_key_event(
    session: &dyn Session,
    element: &ElementRef,
    event_type: &str,
    char_code: u32,
) -> Result<()> {
    let script = format!(
        "var doc = arguments[0].ownerDocument;\n\
         if (doc) {{\n\
           var event;\n\
           try {{\n\
             event = doc.createEvent('KeyEvents');\n\
             event.initKeyEvent('{event_type}', true, true, doc.defaultView, false, false, false, false, 0, {char_code});\n\
           }} catch (e) {{\n\
             event = new KeyboardEvent('{event_type}', {{ bubbles: true, cancelable: true, view: doc.defaultView, charCode: {char_code} }});\n\
           }}\n\
           arguments[0].dispatchEvent(event);\n\
         }}"
    );
    execute_script_if_possible(session, &script, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(())
}

/// Computed value of a CSS property, following `inherit` up the tree.
pub(crate) async fn effective_style(
    session: &dyn Session,
    element: &ElementRef,
    property: &str,
) -> Result<Option<String>> {
    let value = session
        .execute_script(
            EFFECTIVE_STYLE_SCRIPT,
            vec![
                ScriptArg::Element(element.clone()),
                ScriptArg::from(property),
            ],
        )
        .await?;
    Ok(value.as_str().map(str::to_string))
}

/// Whether the element would actually receive a click: it must be
/// visible, and (when the occlusion check is enabled) no other element
/// may cover its center point.
pub(crate) async fn is_clickable(
    session: &dyn Session,
    element: &ElementRef,
    check_visibility: bool,
    occlusion_check: bool,
) -> Result<bool> {
    if check_visibility && !element.is_displayed().await? {
        return Ok(false);
    }

    if !occlusion_check {
        return Ok(true);
    }

    let value = session
        .execute_script(OCCLUSION_SCRIPT, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(value.as_bool().unwrap_or(false))
}

/// Whether the element accepts typed text: an enabled, non-readonly
/// textarea or text-like input. Derived from the element capability; no
/// script round-trip needed.
pub(crate) async fn is_editable(element: &ElementRef, check_visibility: bool) -> Result<bool> {
    if check_visibility && !element.is_displayed().await? {
        return Ok(false);
    }
    if element.attribute("readonly").await?.is_some() || !element.is_enabled().await? {
        return Ok(false);
    }

    match element.tag_name().await?.to_lowercase().as_str() {
        "textarea" => Ok(true),
        "input" => {
            let input_type = element
                .attribute("type")
                .await?
                .unwrap_or_else(|| "text".to_string())
                .to_lowercase();
            Ok(matches!(
                input_type.as_str(),
                "color"
                    | "date"
                    | "datetime-local"
                    | "email"
                    | "file"
                    | "month"
                    | "number"
                    | "password"
                    | "range"
                    | "search"
                    | "tel"
                    | "text"
                    | "time"
                    | "url"
                    | "week"
            ))
        }
        _ => Ok(false),
    }
}
