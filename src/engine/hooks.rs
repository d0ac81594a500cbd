use crate::deferred::DeferredSender;
use crate::error::Result;
use crate::lifecycle::StartupPopup;
use crate::view::ViewSurface;

/// Application callbacks invoked by a layout pass. Every method defaults to a
/// no-op so hosts only implement what they need.
pub trait LayoutHooks {
    /// Write the static header into the command log.
    fn print_command_log_header(&mut self, _surface: &mut dyn ViewSurface) -> Result<()> {
        Ok(())
    }

    fn show_startup_popup(&mut self, _popup: StartupPopup) -> Result<()> {
        Ok(())
    }

    fn create_recent_repos_menu(&mut self) -> Result<()> {
        Ok(())
    }

    /// Start an update check without waiting for it. Results come back
    /// through `deferred`.
    fn check_for_update_in_background(&mut self, _deferred: DeferredSender) {}

    /// Called once right after process setup succeeded.
    fn handle_test_mode(&mut self) {}

    /// Reload repository data at the start of a repository session.
    fn load_new_repo(&mut self) -> Result<()> {
        Ok(())
    }

    /// The main area grew by `lines`; buffered readers behind `view_name`
    /// should pull that much more content.
    fn read_lines(&mut self, _view_name: &str, _lines: usize) {}

    /// The main view changed size since the previous pass.
    fn on_resize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs after re-render dispatch: popup panel sizing, option hints.
    fn after_layout(&mut self, _surface: &mut dyn ViewSurface) -> Result<()> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LayoutHooks for NoopHooks {}
