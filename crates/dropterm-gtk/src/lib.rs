//! dropterm-gtk: GTK4 UI for dropterm
//!
//! This crate implements the drop-down terminal windows using GTK4 and VTE.

mod app;
mod dialogs;
mod panes;
mod tab_bar;
mod terminal;
mod window;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Parser;
use gtk4::prelude::*;
use gtk4::Application;

use dropterm_app::resources::{find_in, search_dirs, ResourceError, UI_FILE_NAME};

use crate::app::{DropApp, StartupOptions};

/// Command-line arguments for dropterm
#[derive(Parser, Debug)]
#[command(
    name = "dropterm",
    version,
    about = "A drop-down terminal emulator"
)]
pub struct Args {
    /// Start in fullscreen mode
    #[arg(long)]
    pub fullscreen: bool,

    /// Start with the windows hidden
    #[arg(long)]
    pub hide: bool,

    /// Working directory of the first new tab
    #[arg(short = 'd', long = "working-directory")]
    pub working_directory: Option<PathBuf>,

    /// Run a command in a new tab instead of the default shell
    #[arg(short = 'e', long = "execute")]
    pub execute: Option<String>,
}

impl Args {
    fn startup_options(&self) -> StartupOptions {
        StartupOptions {
            fullscreen: self.fullscreen,
            hidden: self.hide,
            working_directory: self.working_directory.clone(),
            execute: self.execute.clone(),
        }
    }
}

/// Find the UI description, falling back to the source tree
fn locate_ui_file() -> Result<PathBuf, ResourceError> {
    let source_dir = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/resources"));
    find_in(&search_dirs(Some(source_dir)), UI_FILE_NAME)
}

/// Run the GTK4 application
pub fn run() {
    // Parse command-line arguments first (before GTK consumes them)
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting dropterm");

    let ui_file = match locate_ui_file() {
        Ok(path) => path,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("dropterm: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("Using UI file {}", ui_file.display());

    let options = args.startup_options();

    // A second launch activates the running instance, which toggles
    let app = Application::builder()
        .application_id("com.dropterm.Dropterm")
        .build();

    let state: Rc<RefCell<Option<Rc<DropApp>>>> = Rc::new(RefCell::new(None));
    app.connect_activate(move |app| {
        let running = state.borrow().clone();
        match running {
            Some(drop_app) => drop_app.toggle(),
            None => {
                let drop_app = DropApp::build(app, ui_file.clone(), &options);
                *state.borrow_mut() = Some(drop_app);
            }
        }
    });

    // Arguments were handled by clap already
    let exit_code = app.run_with_args::<&str>(&[]);
    std::process::exit(exit_code.value() as i32);
}
