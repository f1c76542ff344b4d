//! wasmtime-backed module handle.
//!
//! Export contract:
//! - `add: (i32, i32) -> i32`
//! - `scene_new: () -> i32` returns an opaque scene handle
//! - `scene_draw: (i32) -> ()` draws the scene behind a handle
//!
//! Export types are checked at load time. A module must provide `add`, the
//! scene pair, or both with exactly these types; a capability that is missing
//! or typed differently only fails the calls that need it.
//!
//! wasm-bindgen builds of the web crate export `add` with the raw type, but
//! their `scene_new`/`scene_draw` take return-pointer and `self` arguments
//! and depend on JS glue, so only `add` is callable on them here.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};
use wasmtime::{
    Engine, ExternType, FuncType, Instance, Linker, Module, Store, TypedFunc, ValType, WasmParams,
    WasmResults,
};

use trigon::bootstrap::{LoadError, Loader};
use trigon::module::{CallError, Drawable, SceneModule};

use crate::artifact;

/// Where the documented `wasm-pack` build puts the web crate's binary.
pub const DEFAULT_MODULE_PATH: &str = "crates/trigon_web/dist/pkg/trigon_web_bg.wasm";

const EXPORT_ADD: &str = "add";
const EXPORT_SCENE_NEW: &str = "scene_new";
const EXPORT_SCENE_DRAW: &str = "scene_draw";

#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    /// Satisfy unresolved imports with stubs that trap when called. Lets a
    /// module built for a JS host load so its pure exports stay usable.
    pub trap_unknown_imports: bool,
}

/// Loads a module from a file path.
#[derive(Clone)]
pub struct WasmLoader {
    path: PathBuf,
    options: HostOptions,
    engine: Engine,
}

impl WasmLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: HostOptions::default(),
            engine: Engine::default(),
        }
    }

    pub fn with_options(mut self, options: HostOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for WasmLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE_PATH)
    }
}

impl Loader for WasmLoader {
    type Module = WasmModule;

    async fn load(&self) -> Result<WasmModule, LoadError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        debug!(path = %self.path.display(), bytes = bytes.len(), "module read");

        artifact::check_header(&bytes)?;
        WasmModule::instantiate(&self.engine, &bytes, &self.options)
    }
}

/// How a capability's exports line up with the raw contract.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Abi {
    Absent,
    Raw,
    Mismatch(String),
}

impl Abi {
    /// Exported function `name` taking `params` and returning `results` i32s.
    fn of(module: &Module, name: &str, params: usize, results: usize) -> Self {
        match module.get_export(name) {
            None => Abi::Absent,
            Some(ExternType::Func(ty)) => {
                let raw = ty.params().len() == params
                    && ty.results().len() == results
                    && ty.params().chain(ty.results()).all(|t| matches!(t, ValType::I32));
                if raw {
                    Abi::Raw
                } else {
                    Abi::Mismatch(format!("`{name}` has type {}", signature(&ty)))
                }
            }
            Some(_) => Abi::Mismatch(format!("`{name}` is not a function")),
        }
    }

    /// Both scene exports together.
    fn scene(module: &Module) -> Self {
        let new = Abi::of(module, EXPORT_SCENE_NEW, 0, 1);
        let draw = Abi::of(module, EXPORT_SCENE_DRAW, 1, 0);
        if new == Abi::Raw && draw == Abi::Raw {
            return Abi::Raw;
        }
        if new == Abi::Absent && draw == Abi::Absent {
            return Abi::Absent;
        }
        let reasons: Vec<String> = [(EXPORT_SCENE_NEW, new), (EXPORT_SCENE_DRAW, draw)]
            .into_iter()
            .filter_map(|(name, abi)| match abi {
                Abi::Raw => None,
                Abi::Absent => Some(format!("`{name}` is missing")),
                Abi::Mismatch(reason) => Some(reason),
            })
            .collect();
        Abi::Mismatch(format!(
            "{}; expected `{EXPORT_SCENE_NEW}: () -> (i32)` and `{EXPORT_SCENE_DRAW}: (i32) -> ()`",
            reasons.join(", ")
        ))
    }

    fn require(&self, name: &str) -> Result<(), CallError> {
        match self {
            Abi::Raw => Ok(()),
            Abi::Absent => Err(CallError::MissingExport(name.to_string())),
            Abi::Mismatch(reason) => Err(CallError::Signature {
                name: name.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

fn signature(ty: &FuncType) -> String {
    fn list(types: impl Iterator<Item = ValType>) -> String {
        types.map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
    }
    format!("({}) -> ({})", list(ty.params()), list(ty.results()))
}

struct Inner {
    store: RefCell<Store<()>>,
    instance: Instance,
}

impl Inner {
    fn typed<P, R>(&self, name: &str) -> Result<TypedFunc<P, R>, CallError>
    where
        P: WasmParams,
        R: WasmResults,
    {
        let mut store = self.store.borrow_mut();
        let func = self
            .instance
            .get_func(&mut *store, name)
            .ok_or_else(|| CallError::MissingExport(name.to_string()))?;
        func.typed::<P, R>(&*store).map_err(|e| CallError::Signature {
            name: name.to_string(),
            reason: format!("{e:#}"),
        })
    }

    fn call<P, R>(&self, name: &str, params: P) -> Result<R, CallError>
    where
        P: WasmParams,
        R: WasmResults,
    {
        let func = self.typed::<P, R>(name)?;
        let mut store = self.store.borrow_mut();
        func.call(&mut *store, params)
            .map_err(|e| CallError::Trap(format!("{name}: {e:#}")))
    }
}

/// Instantiated module; lives as long as its owner keeps it.
pub struct WasmModule {
    inner: Rc<Inner>,
    add: Abi,
    scene: Abi,
}

impl WasmModule {
    pub fn instantiate(
        engine: &Engine,
        bytes: &[u8],
        options: &HostOptions,
    ) -> Result<Self, LoadError> {
        let module =
            Module::new(engine, bytes).map_err(|e| LoadError::Incompatible(format!("{e:#}")))?;

        let add = match Abi::of(&module, EXPORT_ADD, 2, 1) {
            Abi::Mismatch(reason) => {
                Abi::Mismatch(format!("{reason}; expected `{EXPORT_ADD}: (i32, i32) -> (i32)`"))
            }
            abi => abi,
        };
        let scene = Abi::scene(&module);
        match (&add, &scene) {
            (Abi::Absent, Abi::Absent) => {
                return Err(LoadError::Incompatible(format!(
                    "module exports neither `{EXPORT_ADD}` nor `{EXPORT_SCENE_NEW}`/`{EXPORT_SCENE_DRAW}`"
                )))
            }
            (Abi::Raw, _) | (_, Abi::Raw) => {}
            _ => {
                let reasons: Vec<&str> = [&add, &scene]
                    .into_iter()
                    .filter_map(|abi| match abi {
                        Abi::Mismatch(reason) => Some(reason.as_str()),
                        _ => None,
                    })
                    .collect();
                return Err(LoadError::Incompatible(format!(
                    "no export matches the raw contract: {}",
                    reasons.join("; ")
                )));
            }
        }
        for abi in [&add, &scene] {
            if let Abi::Mismatch(reason) = abi {
                warn!("{reason}");
            }
        }

        let mut linker: Linker<()> = Linker::new(engine);
        if options.trap_unknown_imports {
            linker
                .define_unknown_imports_as_traps(&module)
                .map_err(|e| LoadError::Instantiate(format!("{e:#}")))?;
        }

        let mut store = Store::new(engine, ());
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| LoadError::Instantiate(format!("{e:#}")))?;
        info!(
            add = add == Abi::Raw,
            scene = scene == Abi::Raw,
            imports = module.imports().len(),
            "module instantiated"
        );

        Ok(Self {
            inner: Rc::new(Inner {
                store: RefCell::new(store),
                instance,
            }),
            add,
            scene,
        })
    }
}

impl std::fmt::Debug for WasmModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmModule")
            .field("add", &self.add)
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}

/// Scene handle returned by `scene_new`.
pub struct WasmScene {
    inner: Rc<Inner>,
    handle: i32,
}

impl WasmScene {
    pub fn handle(&self) -> i32 {
        self.handle
    }
}

impl std::fmt::Debug for WasmScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmScene")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drawable for WasmScene {
    fn draw(&self) -> Result<(), CallError> {
        self.inner.call::<i32, ()>(EXPORT_SCENE_DRAW, self.handle)
    }
}

impl SceneModule for WasmModule {
    type Scene = WasmScene;

    fn new_scene(&self) -> Result<WasmScene, CallError> {
        self.scene.require(EXPORT_SCENE_NEW)?;
        let handle = self.inner.call::<(), i32>(EXPORT_SCENE_NEW, ())?;
        Ok(WasmScene {
            inner: Rc::clone(&self.inner),
            handle,
        })
    }

    fn add(&self, a: i32, b: i32) -> Result<i32, CallError> {
        self.add.require(EXPORT_ADD)?;
        self.inner.call::<(i32, i32), i32>(EXPORT_ADD, (a, b))
    }
}
