//! Memoized discovery of the shell globals
//!
//! The first caller that needs a global triggers discovery (one registry
//! roundtrip on a real connection). The result is cached for the lifetime of
//! the registry, including a negative result.

use std::fmt;
use std::rc::Rc;

use log::{debug, info};
use once_cell::unsync::OnceCell;

use super::{LayerShellGlobal, ToplevelShellGlobal};

/// The globals a compositor advertised, as far as this crate cares
#[derive(Clone, Default)]
pub struct Globals {
    pub layer_shell: Option<Rc<dyn LayerShellGlobal>>,
    pub toplevel_shell: Option<Rc<dyn ToplevelShellGlobal>>,
}

impl fmt::Debug for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globals")
            .field(
                "layer_shell",
                &self.layer_shell.as_ref().map(|global| global.version()),
            )
            .field(
                "toplevel_shell",
                &self.toplevel_shell.as_ref().map(|global| global.version()),
            )
            .finish()
    }
}

/// Supplier of shell globals, typically a live wayland connection
pub trait GlobalSource {
    fn discover(&self) -> Globals;
}

/// Lazily discovers and caches the shell globals
pub struct ProtocolRegistry {
    source: Option<Box<dyn GlobalSource>>,
    globals: OnceCell<Globals>,
}

impl ProtocolRegistry {
    pub fn new(source: impl GlobalSource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            globals: OnceCell::new(),
        }
    }

    /// A registry for a session that is not running under wayland
    pub fn unavailable() -> Self {
        Self {
            source: None,
            globals: OnceCell::new(),
        }
    }

    fn globals(&self) -> &Globals {
        self.globals.get_or_init(|| match &self.source {
            Some(source) => {
                let globals = source.discover();
                info!("Shell globals discovered: {:?}", globals);
                globals
            }
            None => {
                debug!("No wayland display, shell globals unavailable");
                Globals::default()
            }
        })
    }

    pub fn layer_shell(&self) -> Option<Rc<dyn LayerShellGlobal>> {
        self.globals().layer_shell.clone()
    }

    pub fn toplevel_shell(&self) -> Option<Rc<dyn ToplevelShellGlobal>> {
        self.globals().toplevel_shell.clone()
    }

    /// Whether the compositor supports the layer shell
    pub fn is_supported(&self) -> bool {
        self.globals().layer_shell.is_some()
    }

    /// Negotiated layer-shell version, 0 when unsupported
    pub fn protocol_version(&self) -> u32 {
        self.globals()
            .layer_shell
            .as_ref()
            .map_or(0, |global| global.version())
    }
}

impl fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("has_source", &self.source.is_some())
            .field("globals", &self.globals.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLayerShell, RequestLog};
    use std::cell::Cell;

    struct CountingSource {
        calls: Rc<Cell<u32>>,
        version: Option<u32>,
    }

    impl GlobalSource for CountingSource {
        fn discover(&self) -> Globals {
            self.calls.set(self.calls.get() + 1);
            Globals {
                layer_shell: self.version.map(|version| {
                    Rc::new(FakeLayerShell::new(version, RequestLog::default()))
                        as Rc<dyn LayerShellGlobal>
                }),
                toplevel_shell: None,
            }
        }
    }

    #[test]
    fn test_discovery_is_memoized() {
        let calls = Rc::new(Cell::new(0));
        let registry = ProtocolRegistry::new(CountingSource {
            calls: calls.clone(),
            version: Some(4),
        });
        assert_eq!(calls.get(), 0);

        assert!(registry.is_supported());
        assert_eq!(registry.protocol_version(), 4);
        assert!(registry.layer_shell().is_some());
        assert!(registry.toplevel_shell().is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_negative_result_is_cached() {
        let calls = Rc::new(Cell::new(0));
        let registry = ProtocolRegistry::new(CountingSource {
            calls: calls.clone(),
            version: None,
        });
        assert!(!registry.is_supported());
        assert_eq!(registry.protocol_version(), 0);
        assert!(!registry.is_supported());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unavailable_registry() {
        let registry = ProtocolRegistry::unavailable();
        assert!(!registry.is_supported());
        assert_eq!(registry.protocol_version(), 0);
        assert!(registry.toplevel_shell().is_none());
    }
}
