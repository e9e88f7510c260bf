// Window and frame navigation
//
// selectWindow resolves through the window locator strategies (no
// restore: the point is to end up there); selectWindow(null) returns to
// the window that was current when the adapter was constructed.
// selectFrame understands positional (`index=N`), named dotted paths
// (`name=a.b.c`), relative switches (`relative=top`/`relative=parent`),
// and bare element locators resolved to a frame element.
//
// Climbing to the parent frame has no native session operation, so the
// frame chain is reconstructed by script: first as a name/id path, and
// when any frame on the chain is anonymous, as a numeric index path.

use crate::commands::{check_is_true, CommandAdapter};
use crate::error::{Error, Result};
use crate::session::{FrameTarget, ScriptArg, Session};

/// Names (or ids, or empty strings for anonymous frames) of the frame
/// chain from the top window down to the parent of the current frame.
const PARENT_NAME_PATH_SCRIPT: &str = "\
var win = window.parent; var names = [];\n\
while (win !== win.top) { names.unshift(win.id || win.name || ''); win = win.parent; }\n\
return names.join(',')";

/// Frame indices of the same chain, for frames without usable names.
const PARENT_INDEX_PATH_SCRIPT: &str = "\
var frameWindow = window.parent; var parentWindow = frameWindow.parent; var indexes = [];\n\
while (frameWindow !== parentWindow) {\n\
  for (var i = 0; i < parentWindow.frames.length; i++) {\n\
    if (parentWindow.frames[i] === frameWindow) { indexes.unshift(i); break; }\n\
  }\n\
  frameWindow = parentWindow; parentWindow = frameWindow.parent;\n\
}\n\
return indexes.join(',')";

const AT_TOP_SCRIPT: &str = "return window.parent === window.top";

impl CommandAdapter {
    /// Switches to the window identified by the locator; a missing,
    /// empty, or literal `"null"` locator returns to the adapter's
    /// original window.
    pub async fn select_window(&self, window_locator: Option<&str>) -> Result<()> {
        match window_locator {
            None | Some("") | Some("null") => {
                let original = self.original_window().clone();
                self.session_ref().switch_to_window(&original).await
            }
            Some(locator) => {
                let handle = self
                    .finder()
                    .find_window(self.session_ref(), locator, false)
                    .await?;
                self.session_ref().switch_to_window(&handle).await
            }
        }
    }

    /// Switches the frame context within the current window.
    pub async fn select_frame(&self, frame_locator: &str) -> Result<()> {
        check_is_true("Frame locator is empty", !frame_locator.trim().is_empty())?;

        if let Some(index) = frame_locator.strip_prefix("index=") {
            let index: usize = index.parse().map_err(|_| {
                Error::InvalidArgument(format!("Invalid frame locator: {frame_locator}"))
            })?;
            self.session_ref()
                .switch_to_frame(FrameTarget::Index(index))
                .await
        } else if let Some(path) = frame_locator.strip_prefix("name=") {
            check_is_true(
                format!("Invalid frame locator: {frame_locator}"),
                !path.is_empty() && path.split('.').all(|part| !part.is_empty()),
            )?;
            for name in path.split('.') {
                self.session_ref()
                    .switch_to_frame(FrameTarget::Name(name.to_string()))
                    .await?;
            }
            Ok(())
        } else if frame_locator == "relative=top" {
            self.session_ref().switch_to_default_content().await
        } else if frame_locator == "relative=parent" {
            self.select_parent_frame().await
        } else {
            let frame = self.find_element(frame_locator).await?;
            self.session_ref()
                .switch_to_frame(FrameTarget::Element(frame))
                .await
        }
    }

    async fn select_parent_frame(&self) -> Result<()> {
        // one level below the top (or at the top itself), the parent is
        // the top document
        let at_top = self
            .session_ref()
            .execute_script(AT_TOP_SCRIPT, Vec::<ScriptArg>::new())
            .await?
            .as_bool()
            .unwrap_or(false);
        if at_top {
            return self.session_ref().switch_to_default_content().await;
        }

        if !self.switch_to_parent_by_names().await? {
            self.switch_to_parent_by_indexes().await?;
        }
        Ok(())
    }

    /// Climbs to the parent via the name/id path. Returns false when any
    /// frame on the chain has no usable name, leaving the context
    /// unchanged.
    async fn switch_to_parent_by_names(&self) -> Result<bool> {
        let path = self
            .session_ref()
            .execute_script(PARENT_NAME_PATH_SCRIPT, Vec::<ScriptArg>::new())
            .await?;
        let path = path.as_str().unwrap_or("");

        if path.is_empty() || path.split(',').any(|name| name.is_empty()) {
            return Ok(false);
        }

        self.session_ref().switch_to_default_content().await?;
        for name in path.split(',') {
            self.session_ref()
                .switch_to_frame(FrameTarget::Name(name.to_string()))
                .await?;
        }
        Ok(true)
    }

    /// Climbs to the parent via the numeric index path; used when frame
    /// names are unavailable. An empty path means the parent is the top
    /// document.
    async fn switch_to_parent_by_indexes(&self) -> Result<()> {
        let path = self
            .session_ref()
            .execute_script(PARENT_INDEX_PATH_SCRIPT, Vec::<ScriptArg>::new())
            .await?;
        let path = path.as_str().unwrap_or("").to_string();

        self.session_ref().switch_to_default_content().await?;
        if path.is_empty() {
            return Ok(());
        }

        for index in path.split(',') {
            let index: usize = index.parse().map_err(|_| {
                Error::Session(format!("Unusable frame index path: {path}"))
            })?;
            self.session_ref()
                .switch_to_frame(FrameTarget::Index(index))
                .await?;
        }
        Ok(())
    }
}
