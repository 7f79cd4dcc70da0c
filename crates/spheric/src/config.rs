//! Configuration parsing and validation for the moving-square benchmark.

use serde::{Deserialize, Serialize};
use sph::{Kernel, KernelFamily, TimeStep};
use std::fs;

/// Axis-aligned rectangle, used for the driven obstacle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x0: f64,
    /// Bottom edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
}

impl Rect {
    /// Whether `(x, y)` lies inside the rectangle (closed bounds).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Edge length along x.
    pub fn side(&self) -> f64 {
        self.x1 - self.x0
    }
}

/// Benchmark case configuration.
///
/// Every field has a default reproducing the published SPHERIC benchmark 6
/// setup, so an empty JSON object (or no config file at all) runs the
/// reference case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    /// Domain length (x).
    #[serde(default = "default_lx")]
    pub lx: f64,
    /// Domain height (y).
    #[serde(default = "default_ly")]
    pub ly: f64,
    /// Peak obstacle speed, the velocity scale of the case.
    #[serde(default = "default_u_max")]
    pub u_max: f64,
    /// Artificial sound speed as a multiple of `u_max`.
    #[serde(default = "default_sound_speed_factor")]
    pub sound_speed_factor: f64,
    /// Reference density.
    #[serde(default = "default_rho0")]
    pub rho0: f64,
    /// Background pressure scale: pb = b * p0.
    #[serde(default = "default_b")]
    pub b: f64,
    /// Driven obstacle rectangle, strictly inside the domain.
    #[serde(default = "default_obstacle")]
    pub obstacle: Rect,
    /// Reynolds number based on `u_max` and the obstacle side.
    #[serde(default = "default_reynolds")]
    pub reynolds: f64,
    /// Lattice resolution: dx = 0.2 * lx / nx.
    #[serde(default = "default_nx")]
    pub nx: u32,
    /// Wall thickness in particle layers.
    #[serde(default = "default_ghost_layers")]
    pub ghost_layers: u32,
    /// Smoothing length as a multiple of dx.
    #[serde(default = "default_hdx")]
    pub hdx: f64,
    /// Smoothing kernel family.
    #[serde(default = "default_kernel")]
    pub kernel: KernelFamily,
    /// Hexagonal close packing instead of the square lattice.
    #[serde(default)]
    pub hcp: bool,
    /// Simulated end time.
    #[serde(default = "default_t_final")]
    pub t_final: f64,
    /// Recompute dt from the CFL bounds every step instead of fixing it.
    #[serde(default)]
    pub adaptive_dt: bool,
    /// Safety factor on the stability bounds.
    #[serde(default = "default_dt_safety")]
    pub dt_safety: f64,
    /// Hard ceiling on the step size.
    #[serde(default = "default_dt_force")]
    pub dt_force: f64,
    /// Times at which snapshots are written.
    #[serde(default = "default_output_times")]
    pub output_times: Vec<f64>,
    /// Directory snapshots are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_lx() -> f64 {
    10.0
}

fn default_ly() -> f64 {
    5.0
}

fn default_u_max() -> f64 {
    1.0
}

fn default_sound_speed_factor() -> f64 {
    25.0
}

fn default_rho0() -> f64 {
    1.0
}

fn default_b() -> f64 {
    1.0
}

fn default_obstacle() -> Rect {
    Rect {
        x0: 1.0,
        y0: 2.0,
        x1: 2.0,
        y1: 3.0,
    }
}

fn default_reynolds() -> f64 {
    100.0
}

fn default_nx() -> u32 {
    50
}

fn default_ghost_layers() -> u32 {
    4
}

fn default_hdx() -> f64 {
    1.2
}

fn default_kernel() -> KernelFamily {
    KernelFamily::QuinticSpline
}

fn default_t_final() -> f64 {
    8.0
}

fn default_dt_safety() -> f64 {
    0.8
}

fn default_dt_force() -> f64 {
    1.0
}

fn default_output_times() -> Vec<f64> {
    vec![1.0, 3.0, 5.0, 7.0]
}

fn default_output_dir() -> String {
    "output".to_string()
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            lx: default_lx(),
            ly: default_ly(),
            u_max: default_u_max(),
            sound_speed_factor: default_sound_speed_factor(),
            rho0: default_rho0(),
            b: default_b(),
            obstacle: default_obstacle(),
            reynolds: default_reynolds(),
            nx: default_nx(),
            ghost_layers: default_ghost_layers(),
            hdx: default_hdx(),
            kernel: default_kernel(),
            hcp: false,
            t_final: default_t_final(),
            adaptive_dt: false,
            dt_safety: default_dt_safety(),
            dt_force: default_dt_force(),
            output_times: default_output_times(),
            output_dir: default_output_dir(),
        }
    }
}

impl CaseConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file {path}: {e}"))?;

        let config: CaseConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("failed to parse config JSON: {e}"))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.lx.is_finite() || self.lx <= 0.0 || !self.ly.is_finite() || self.ly <= 0.0 {
            return Err("domain lengths must be positive".to_string());
        }
        if self.u_max <= 0.0 {
            return Err("u_max must be positive".to_string());
        }
        if self.sound_speed_factor <= 0.0 {
            return Err("sound_speed_factor must be positive".to_string());
        }
        if self.rho0 <= 0.0 {
            return Err("rho0 must be positive".to_string());
        }
        if self.b < 0.0 {
            return Err("background pressure scale b must be non-negative".to_string());
        }
        if self.obstacle.x0 >= self.obstacle.x1 || self.obstacle.y0 >= self.obstacle.y1 {
            return Err("obstacle rectangle must have positive extent".to_string());
        }
        if self.obstacle.x0 <= 0.0
            || self.obstacle.x1 >= self.lx
            || self.obstacle.y0 <= 0.0
            || self.obstacle.y1 >= self.ly
        {
            return Err("obstacle must lie strictly inside the domain".to_string());
        }
        if self.reynolds <= 0.0 {
            return Err("reynolds must be positive".to_string());
        }
        if self.nx == 0 {
            return Err("nx must be at least 1".to_string());
        }
        if self.hdx <= 0.0 {
            return Err("hdx must be positive".to_string());
        }
        let kernel = Kernel::new(self.kernel, 2).map_err(|e| e.to_string())?;
        if (self.ghost_layers as f64) < kernel.radius_scale() * self.hdx {
            return Err(format!(
                "ghost_layers = {} is thinner than the kernel support ({} layers needed)",
                self.ghost_layers,
                (kernel.radius_scale() * self.hdx).ceil()
            ));
        }
        if self.t_final <= 0.0 || !self.t_final.is_finite() {
            return Err("t_final must be positive and finite".to_string());
        }
        if self.dt_safety <= 0.0 || self.dt_safety > 1.0 {
            return Err("dt_safety must be in range (0, 1]".to_string());
        }
        if self.dt_force <= 0.0 {
            return Err("dt_force must be positive".to_string());
        }
        if self.output_times.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err("output times must be positive and finite".to_string());
        }
        if self.output_times.windows(2).any(|w| w[0] > w[1]) {
            return Err("output times must be sorted ascending".to_string());
        }
        if self.output_dir.is_empty() {
            return Err("output_dir must not be empty".to_string());
        }
        Ok(())
    }

    /// Lattice spacing.
    pub fn dx(&self) -> f64 {
        0.2 * self.lx / self.nx as f64
    }

    /// Smoothing length.
    pub fn h0(&self) -> f64 {
        self.hdx * self.dx()
    }

    /// Artificial sound speed.
    pub fn c0(&self) -> f64 {
        self.sound_speed_factor * self.u_max
    }

    /// Reference (and background) pressure.
    pub fn p0(&self) -> f64 {
        self.c0() * self.c0() * self.rho0
    }

    /// Kinematic viscosity from the Reynolds number.
    pub fn nu(&self) -> f64 {
        self.u_max * self.obstacle.side() / self.reynolds
    }

    /// Ghost wall thickness in length units.
    pub fn ghost(&self) -> f64 {
        self.ghost_layers as f64 * self.dx()
    }

    /// Fixed step size from the static acoustic and viscous bounds.
    pub fn fixed_dt(&self) -> f64 {
        let h0 = self.h0();
        let dt_cfl = 0.25 * h0 / (self.c0() + self.u_max);
        let dt_viscous = 0.125 * h0 * h0 / self.nu();
        self.dt_safety * dt_cfl.min(dt_viscous).min(self.dt_force)
    }

    /// Step-size policy for the solver.
    pub fn time_step(&self) -> TimeStep {
        if self.adaptive_dt {
            TimeStep::Adaptive {
                safety: self.dt_safety,
                sound_speed: self.c0(),
                nu: self.nu(),
                dt_force: self.dt_force,
            }
        } else {
            TimeStep::Fixed(self.fixed_dt())
        }
    }
}
