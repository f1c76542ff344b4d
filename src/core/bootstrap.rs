//! Two-phase startup: load the module once, then make exactly one call.
//!
//! [`boot`] is the whole protocol. A failed load is reported once through the
//! [`Console`] and the call is never attempted. A successful load logs
//! `wasm loaded` before the call runs, and the handle is returned so the
//! caller can keep it alive for as long as it likes.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::module::{CallError, Drawable, SceneModule};

/// Line logged once the module handle is available.
pub const LOADED_MESSAGE: &str = "wasm loaded";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module not found at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("incompatible module: {0}")]
    Incompatible(String),
    #[error("failed to instantiate module: {0}")]
    Instantiate(String),
}

#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Call(#[from] CallError),
}

/// Acquires a module handle. Each call to `load` is one independent attempt.
pub trait Loader {
    type Module: SceneModule;

    fn load(&self) -> impl Future<Output = Result<Self::Module, LoadError>>;
}

/// Diagnostic sink; the browser console or a log.
pub trait Console {
    fn log(&self, line: &str);
    fn error(&self, line: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn log(&self, line: &str) {
        tracing::info!("{line}");
    }

    fn error(&self, line: &str) {
        tracing::error!("{line}");
    }
}

/// Operation to run after the module is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// Construct a scene through the zero-argument factory and draw it.
    Draw,
    /// Add two integers and log the sum.
    Add(i32, i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Drawn,
    Sum(i32),
}

#[derive(Debug)]
pub struct Booted<M> {
    pub module: M,
    pub outcome: Outcome,
}

/// Run a single call against a loaded module.
pub fn invoke<M, C>(module: &M, call: Call, console: &C) -> Result<Outcome, CallError>
where
    M: SceneModule + ?Sized,
    C: Console + ?Sized,
{
    match call {
        Call::Draw => {
            let scene = module.new_scene()?;
            scene.draw()?;
            Ok(Outcome::Drawn)
        }
        Call::Add(a, b) => {
            let sum = module.add(a, b)?;
            console.log(&format!("add({a}, {b}) = {sum}"));
            Ok(Outcome::Sum(sum))
        }
    }
}

/// Load, report, then invoke `call` exactly once.
pub async fn boot<L, C>(loader: &L, call: Call, console: &C) -> Result<Booted<L::Module>, BootError>
where
    L: Loader + ?Sized,
    C: Console + ?Sized,
{
    let module = match loader.load().await {
        Ok(module) => module,
        Err(e) => {
            console.error(&format!("error loading wasm: {e}"));
            return Err(BootError::Load(e));
        }
    };
    console.log(LOADED_MESSAGE);

    match invoke(&module, call, console) {
        Ok(outcome) => Ok(Booted { module, outcome }),
        Err(e) => {
            console.error(&format!("error running wasm: {e}"));
            Err(BootError::Call(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Line {
        Log(String),
        Error(String),
    }

    #[derive(Default)]
    struct RecordingConsole {
        lines: RefCell<Vec<Line>>,
    }

    impl RecordingConsole {
        fn lines(&self) -> Vec<Line> {
            self.lines.borrow().clone()
        }
    }

    impl Console for RecordingConsole {
        fn log(&self, line: &str) {
            self.lines.borrow_mut().push(Line::Log(line.to_string()));
        }

        fn error(&self, line: &str) {
            self.lines.borrow_mut().push(Line::Error(line.to_string()));
        }
    }

    type Events = Rc<RefCell<Vec<&'static str>>>;

    struct StubScene {
        events: Events,
    }

    impl Drawable for StubScene {
        fn draw(&self) -> Result<(), CallError> {
            self.events.borrow_mut().push("draw");
            Ok(())
        }
    }

    #[derive(Debug)]
    struct StubModule {
        events: Events,
        construct_fails: bool,
    }

    impl SceneModule for StubModule {
        type Scene = StubScene;

        fn new_scene(&self) -> Result<StubScene, CallError> {
            self.events.borrow_mut().push("new_scene");
            if self.construct_fails {
                return Err(CallError::Construct("Can't get canvas element".to_string()));
            }
            Ok(StubScene {
                events: Rc::clone(&self.events),
            })
        }

        fn add(&self, a: i32, b: i32) -> Result<i32, CallError> {
            self.events.borrow_mut().push("add");
            Ok(a + b)
        }
    }

    struct StubLoader {
        events: Events,
        fail: bool,
        construct_fails: bool,
    }

    impl StubLoader {
        fn new(fail: bool) -> Self {
            Self {
                events: Events::default(),
                fail,
                construct_fails: false,
            }
        }

        fn events(&self) -> Vec<&'static str> {
            self.events.borrow().clone()
        }
    }

    impl Loader for StubLoader {
        type Module = StubModule;

        async fn load(&self) -> Result<StubModule, LoadError> {
            self.events.borrow_mut().push("load");
            if self.fail {
                return Err(LoadError::Incompatible("bad magic".to_string()));
            }
            Ok(StubModule {
                events: Rc::clone(&self.events),
                construct_fails: self.construct_fails,
            })
        }
    }

    #[test]
    fn draw_runs_once_after_load() {
        let loader = StubLoader::new(false);
        let console = RecordingConsole::default();

        let booted = pollster::block_on(boot(&loader, Call::Draw, &console)).unwrap();

        assert_eq!(booted.outcome, Outcome::Drawn);
        assert_eq!(loader.events(), vec!["load", "new_scene", "draw"]);
        assert_eq!(console.lines(), vec![Line::Log("wasm loaded".to_string())]);
    }

    #[test]
    fn add_logs_single_result_line() {
        let loader = StubLoader::new(false);
        let console = RecordingConsole::default();

        let booted = pollster::block_on(boot(&loader, Call::Add(2, 3), &console)).unwrap();

        assert_eq!(booted.outcome, Outcome::Sum(5));
        assert_eq!(loader.events(), vec!["load", "add"]);
        let lines = console.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Line::Log("wasm loaded".to_string()));
        assert!(matches!(&lines[1], Line::Log(l) if l.contains('5')));
    }

    #[test]
    fn failed_load_never_calls_and_reports_once() {
        for call in [Call::Draw, Call::Add(2, 3)] {
            let loader = StubLoader::new(true);
            let console = RecordingConsole::default();

            let err = pollster::block_on(boot(&loader, call, &console)).unwrap_err();

            assert!(matches!(err, BootError::Load(LoadError::Incompatible(_))));
            assert_eq!(loader.events(), vec!["load"]);
            let lines = console.lines();
            assert_eq!(lines.len(), 1);
            assert!(matches!(&lines[0], Line::Error(l) if l.contains("bad magic")));
        }
    }

    #[test]
    fn failed_call_is_reported_after_load() {
        let mut loader = StubLoader::new(false);
        loader.construct_fails = true;
        let console = RecordingConsole::default();

        let err = pollster::block_on(boot(&loader, Call::Draw, &console)).unwrap_err();

        assert!(matches!(err, BootError::Call(CallError::Construct(_))));
        assert_eq!(loader.events(), vec!["load", "new_scene"]);
        let lines = console.lines();
        assert_eq!(lines[0], Line::Log("wasm loaded".to_string()));
        assert!(matches!(&lines[1], Line::Error(l) if l.starts_with("error running wasm")));
    }

    #[test]
    fn repeated_boots_share_no_state() {
        let loader = StubLoader::new(false);
        for _ in 0..2 {
            let console = RecordingConsole::default();
            pollster::block_on(boot(&loader, Call::Add(2, 3), &console)).unwrap();
            assert_eq!(console.lines().len(), 2);
        }
        assert_eq!(loader.events(), vec!["load", "add", "load", "add"]);
    }

    #[test]
    fn native_loader_end_to_end() {
        let loader = crate::native::NativeLoader::default();
        let console = RecordingConsole::default();

        let booted = pollster::block_on(boot(&loader, Call::Draw, &console)).unwrap();

        let frame = booted.module.last_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (300, 150));
        assert_eq!(frame.pixel(150, 75), Some([255, 0, 0, 255]));
        assert_eq!(console.lines(), vec![Line::Log("wasm loaded".to_string())]);
    }
}
