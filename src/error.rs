/*
 *  error.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Asset and top-level error types
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::display::error::{DisplayError, DisplayFactoryError};
use crate::svgimage::SvgImageError;

/// Fonts, icons and the base image.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("svg {path}: {source}")]
    Svg {
        path: PathBuf,
        #[source]
        source: SvgImageError,
    },
    #[error("invalid font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
    #[error("base image {path} is {actual:?}, canvas is {expected:?}")]
    BaseImageSize {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Everything that can end a render pass.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("could not export {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl From<DisplayFactoryError> for DashboardError {
    fn from(err: DisplayFactoryError) -> Self {
        DashboardError::Display(err.into())
    }
}
