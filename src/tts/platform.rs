use std::path::PathBuf;

use tracing::debug;

use crate::{Error, Result};

use super::{espeak, Backend, Engine, EngineId, EspeakEngine};

/// The engines installed on this machine.
///
/// On Windows these are SAPI, which is also the default, and `espeak-ng` if it can be found.
/// Elsewhere `espeak-ng` is the only engine and the default.
#[derive(Debug, Clone)]
pub struct PlatformBackend {
    espeak_program: PathBuf,
}

impl PlatformBackend {
    /// The `espeak-ng` executable used unless configured otherwise.
    pub const DEFAULT_ESPEAK_PROGRAM: &'static str = "espeak-ng";

    /// Creates a backend that runs the given `espeak-ng` executable.
    pub fn new<P: Into<PathBuf>>(espeak_program: P) -> Self {
        Self {
            espeak_program: espeak_program.into(),
        }
    }

    fn default_engine_name() -> &'static str {
        #[cfg(windows)]
        {
            super::sapi::ENGINE_NAME
        }
        #[cfg(not(windows))]
        {
            espeak::ENGINE_NAME
        }
    }
}

impl Default for PlatformBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ESPEAK_PROGRAM)
    }
}

impl Backend for PlatformBackend {
    fn available_engines(&self) -> Vec<String> {
        let mut engines = Vec::new();
        #[cfg(windows)]
        engines.push(super::sapi::ENGINE_NAME.to_string());
        if espeak::is_available(&self.espeak_program) {
            engines.push(espeak::ENGINE_NAME.to_string());
        }
        debug!("Available engines: {:?}", engines);
        engines
    }

    fn create(&self, id: &EngineId) -> Result<Box<dyn Engine>> {
        let name = match id {
            EngineId::Default => Self::default_engine_name(),
            EngineId::Named(name) => name.as_str(),
        };
        match name {
            espeak::ENGINE_NAME => Ok(Box::new(EspeakEngine::new(&self.espeak_program)?)),
            #[cfg(windows)]
            super::sapi::ENGINE_NAME => Ok(Box::new(super::SapiEngine::new()?)),
            _ => Err(Error::Unavailable(format!("unknown engine {}", name))),
        }
    }
}
