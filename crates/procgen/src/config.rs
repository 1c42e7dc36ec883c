//! Line-oriented buildings configuration.
//!
//! One option per line, `keyword value...`, `#` starts a comment. Global keys
//! set placement parameters; material keys edit the material under
//! construction, which `add_material` commits (weighted by the last
//! `probability`). Errors never stop the load: each bad line is logged and
//! recorded, the affected setting keeps its previous value, and the caller
//! gets the aggregate through [`ConfigLoad::had_error`].

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use engine_core::{Aabb, Color};
use thiserror::Error;

use crate::material::MaterialProfile;
use crate::params::{BuildingParams, PlacementParams};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("line {line}: unrecognized buildings keyword `{key}`")]
    UnknownKey { line: usize, key: String },
    #[error("line {line}: error reading buildings config option `{key}`: {reason}")]
    Malformed {
        line: usize,
        key: String,
        reason: String,
    },
    #[error("line {line}: value for `{key}` out of range: {reason}")]
    OutOfRange {
        line: usize,
        key: String,
        reason: String,
    },
    #[error("no building material has a non-zero probability")]
    NoSelectableMaterial,
}

/// Result of parsing a buildings config: usable parameters plus every
/// non-fatal error encountered on the way.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub params: BuildingParams,
    pub errors: Vec<ConfigError>,
}

impl ConfigLoad {
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Read and parse a buildings config file.
pub fn load_buildings_config(path: &Path) -> anyhow::Result<ConfigLoad> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading buildings config {}", path.display()))?;
    let load = parse_buildings_config(&text)
        .with_context(|| format!("finalizing buildings config {}", path.display()))?;
    if load.had_error() {
        log::warn!(
            "Buildings config {} loaded with {} error(s)",
            path.display(),
            load.errors.len()
        );
    }
    Ok(load)
}

/// Parse config text. Only an unusable material list is fatal.
pub fn parse_buildings_config(text: &str) -> Result<ConfigLoad, ConfigError> {
    let mut parser = ConfigParser::default();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("");
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();
        if let Err(err) = parser.apply(i + 1, key, &args) {
            log::warn!("{err}");
            parser.errors.push(err);
        }
    }
    parser.finish()
}

/// Why a single value failed; turned into a [`ConfigError`] with line and key.
enum ValueError {
    Malformed(String),
    OutOfRange(String),
}

type ValueResult<T> = Result<T, ValueError>;

fn one_arg<'a>(args: &[&'a str]) -> ValueResult<&'a str> {
    match args {
        [v] => Ok(v),
        [] => Err(ValueError::Malformed("missing value".to_string())),
        _ => Err(ValueError::Malformed(format!(
            "expected 1 value, found {}",
            args.len()
        ))),
    }
}

fn parse_num<T: FromStr>(s: &str) -> ValueResult<T> {
    s.parse()
        .map_err(|_| ValueError::Malformed(format!("cannot parse `{s}`")))
}

fn parse_floats<const N: usize>(args: &[&str]) -> ValueResult<[f32; N]> {
    if args.len() != N {
        return Err(ValueError::Malformed(format!(
            "expected {N} values, found {}",
            args.len()
        )));
    }
    let mut out = [0.0; N];
    for (o, a) in out.iter_mut().zip(args) {
        *o = parse_num(a)?;
    }
    Ok(out)
}

fn read_float(args: &[&str]) -> ValueResult<f32> {
    parse_num(one_arg(args)?)
}

fn read_uint(args: &[&str]) -> ValueResult<u32> {
    parse_num(one_arg(args)?)
}

fn read_bool(args: &[&str]) -> ValueResult<bool> {
    match one_arg(args)? {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(ValueError::Malformed(format!("`{other}` is not a bool"))),
    }
}

fn read_zero_one_float(args: &[&str]) -> ValueResult<f32> {
    let v = read_float(args)?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(ValueError::OutOfRange(format!("{v} is not in [0, 1]")))
    }
}

fn read_num_sides(args: &[&str]) -> ValueResult<u32> {
    let v = read_uint(args)?;
    if v < 3 {
        return Err(ValueError::OutOfRange(format!("{v} < 3")));
    }
    Ok(v)
}

fn read_cube(args: &[&str]) -> ValueResult<Aabb> {
    let [x1, x2, y1, y2, z1, z2] = parse_floats::<6>(args)?;
    Ok(Aabb::from_ranges(x1, x2, y1, y2, z1, z2))
}

/// Per-axis size bounds: every lower bound positive and no larger than its upper bound.
fn read_size_range(args: &[&str]) -> ValueResult<Aabb> {
    let range = read_cube(args)?;
    for (axis, d) in ["x", "y", "z"].into_iter().zip(0..3) {
        let (lo, hi) = range.axis(d);
        if !(lo > 0.0) || hi < lo {
            return Err(ValueError::OutOfRange(format!(
                "{axis} range [{lo}, {hi}] must satisfy 0 < min <= max"
            )));
        }
    }
    Ok(range)
}

fn read_color(args: &[&str]) -> ValueResult<Color> {
    parse_floats::<4>(args).map(Color::from_array)
}

fn read_str(args: &[&str]) -> ValueResult<String> {
    one_arg(args).map(str::to_string)
}

#[derive(Default)]
struct ConfigParser {
    placement: PlacementParams,
    cur_mat: MaterialProfile,
    cur_prob: Option<u32>,
    materials: Vec<MaterialProfile>,
    errors: Vec<ConfigError>,
}

impl ConfigParser {
    fn apply(&mut self, line: usize, key: &str, args: &[&str]) -> Result<(), ConfigError> {
        let wrap = |e: ValueError| match e {
            ValueError::Malformed(reason) => ConfigError::Malformed {
                line,
                key: key.to_string(),
                reason,
            },
            ValueError::OutOfRange(reason) => ConfigError::OutOfRange {
                line,
                key: key.to_string(),
                reason,
            },
        };
        let g = &mut self.placement;
        let m = &mut self.cur_mat;
        match key {
            // global parameters
            "flatten_mesh" => g.flatten_mesh = read_bool(args).map_err(wrap)?,
            "num_place" => g.num_place = read_uint(args).map_err(wrap)?,
            "num_tries" => g.num_tries = read_uint(args).map_err(wrap)?,
            "pos_range" => g.pos_range = read_cube(args).map_err(wrap)?,
            "place_radius" => g.place_radius = read_float(args).map_err(wrap)?,
            "max_delta_z" => g.max_delta_z = read_float(args).map_err(wrap)?,
            "min_level_height" => g.min_level_height = read_float(args).map_err(wrap)?,
            "ao_factor" => g.ao_factor = read_zero_one_float(args).map_err(wrap)?,
            // specified in degrees, stored in radians
            "max_rot_angle" => g.max_rot_angle = read_float(args).map_err(wrap)?.to_radians(),
            // material parameters
            "split_prob" => m.split_prob = read_zero_one_float(args).map_err(wrap)?,
            "cube_prob" => m.cube_prob = read_zero_one_float(args).map_err(wrap)?,
            "round_prob" => m.round_prob = read_zero_one_float(args).map_err(wrap)?,
            "min_levels" => m.min_levels = read_uint(args).map_err(wrap)?,
            "max_levels" => m.max_levels = read_uint(args).map_err(wrap)?,
            "min_sides" => m.min_sides = read_num_sides(args).map_err(wrap)?,
            "max_sides" => m.max_sides = read_num_sides(args).map_err(wrap)?,
            "size_range" => m.size_range = read_size_range(args).map_err(wrap)?,
            "min_altitude" => m.min_alt = read_float(args).map_err(wrap)?,
            "max_altitude" => m.max_alt = read_float(args).map_err(wrap)?,
            // material textures
            "side_tscale" => m.side_tex.tscale = read_float(args).map_err(wrap)?,
            "roof_tscale" => m.roof_tex.tscale = read_float(args).map_err(wrap)?,
            "side_tid" => m.side_tex.tid = Some(read_str(args).map_err(wrap)?),
            "side_nm_tid" => m.side_tex.nm_tid = Some(read_str(args).map_err(wrap)?),
            "roof_tid" => m.roof_tex.tid = Some(read_str(args).map_err(wrap)?),
            "roof_nm_tid" => m.roof_tex.nm_tid = Some(read_str(args).map_err(wrap)?),
            // material colors
            "side_color" => {
                let c = read_color(args).map_err(wrap)?;
                m.side_color.cmin = c;
                m.side_color.cmax = c;
            }
            "side_color_min" => m.side_color.cmin = read_color(args).map_err(wrap)?,
            "side_color_max" => m.side_color.cmax = read_color(args).map_err(wrap)?,
            "side_color_grayscale_rand" => {
                m.side_color.grayscale_rand = read_float(args).map_err(wrap)?
            }
            "roof_color" => {
                let c = read_color(args).map_err(wrap)?;
                m.roof_color.cmin = c;
                m.roof_color.cmax = c;
            }
            "roof_color_min" => m.roof_color.cmin = read_color(args).map_err(wrap)?,
            "roof_color_max" => m.roof_color.cmax = read_color(args).map_err(wrap)?,
            "roof_color_grayscale_rand" => {
                m.roof_color.grayscale_rand = read_float(args).map_err(wrap)?
            }
            // special commands
            "probability" => self.cur_prob = Some(read_uint(args).map_err(wrap)?),
            "add_material" => self.add_cur_mat(),
            _ => {
                return Err(ConfigError::UnknownKey {
                    line,
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Commit a copy of the current material; later lines keep editing it.
    fn add_cur_mat(&mut self) {
        let mut mat = self.cur_mat.clone();
        mat.probability = self.cur_prob.unwrap_or(1);
        self.materials.push(mat);
    }

    fn finish(mut self) -> Result<ConfigLoad, ConfigError> {
        if self.materials.is_empty() {
            // fall back to the current (maybe default) material
            self.add_cur_mat();
        }
        let params = BuildingParams::new(self.placement, self.materials)?;
        log::debug!(
            "Parsed buildings config: {} material(s), {} buildings requested",
            params.materials().len(),
            params.placement.num_place
        );
        Ok(ConfigLoad {
            params,
            errors: self.errors,
        })
    }
}
