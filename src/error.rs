//! Error types for rdtype.
//!
//! Simulation setup, configuration loading, GPU initialization and the
//! interactive viewer each have their own error enum. Stepping a field never
//! fails: everything that can go wrong is caught when an instance is built.

use std::fmt;

/// Errors that can occur when creating a simulation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Width or height is zero, or `width * height` overflows.
    InvalidDimensions { width: usize, height: usize },
    /// The concentration or mask buffers could not be allocated.
    Allocation { cells: usize },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidDimensions { width, height } => {
                write!(f, "Invalid field dimensions {}x{}", width, height)
            }
            SimulationError::Allocation { cells } => {
                write!(f, "Failed to allocate field buffers for {} cells", cells)
            }
        }
    }
}

impl std::error::Error for SimulationError {}

/// Errors that can occur while loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    Io(std::io::Error),
    /// The file is not valid configuration JSON.
    Parse(serde_json::Error),
    /// A color string is not of the form `#rrggbb`.
    InvalidColor(String),
    /// Unknown font family name.
    UnknownFont(String),
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::InvalidColor(s) => {
                write!(f, "Invalid color '{}': expected a hex color like #00c3ff", s)
            }
            ConfigError::UnknownFont(s) => write!(f, "Unknown font family '{}'", s),
            ConfigError::UnknownPreset(s) => write!(f, "Unknown preset '{}'", s),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(
                f,
                "No compatible GPU adapter found. \
                 Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."
            ),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running the interactive viewer.
#[derive(Debug)]
pub enum ViewerError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The simulation instance could not be created.
    Simulation(SimulationError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            ViewerError::Window(e) => write!(f, "Failed to create window: {}", e),
            ViewerError::Gpu(e) => write!(f, "GPU error: {}", e),
            ViewerError::Simulation(e) => write!(f, "Simulation error: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::EventLoop(e) => Some(e),
            ViewerError::Window(e) => Some(e),
            ViewerError::Gpu(e) => Some(e),
            ViewerError::Simulation(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ViewerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(e: winit::error::OsError) -> Self {
        ViewerError::Window(e)
    }
}

impl From<GpuError> for ViewerError {
    fn from(e: GpuError) -> Self {
        ViewerError::Gpu(e)
    }
}

impl From<SimulationError> for ViewerError {
    fn from(e: SimulationError) -> Self {
        ViewerError::Simulation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_simulation_error_display() {
        let err = SimulationError::InvalidDimensions {
            width: 0,
            height: 300,
        };
        assert_eq!(err.to_string(), "Invalid field dimensions 0x300");

        let err = SimulationError::Allocation { cells: 90_000 };
        assert!(err.to_string().contains("90000"));
    }

    #[test]
    fn test_config_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ConfigError::from(io);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Failed to read config file"));

        let err = ConfigError::InvalidColor("red".into());
        assert!(err.source().is_none());
        assert!(err.to_string().contains("'red'"));
    }

    #[test]
    fn test_viewer_error_wraps_simulation_error() {
        let err = ViewerError::from(SimulationError::Allocation { cells: 4 });
        assert!(matches!(err, ViewerError::Simulation(_)));
        assert!(err.source().is_some());
    }
}
