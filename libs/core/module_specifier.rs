// Copyright 2018-2026 the Deno authors. MIT license.

use std::borrow::Cow;
use std::path::Path;

use deno_path_util::normalize_path;
use deno_path_util::url_to_file_path;
use url::Url;

/// Error indicating the reason resolving a module specifier failed.
#[derive(
  Clone, Debug, Eq, PartialEq, thiserror::Error, deno_error::JsError,
)]
#[class(uri)]
pub enum ModuleResolutionError {
  #[error(
    "Relative import path \"{specifier}\" not prefixed with / or ./ or ../{}",
    .maybe_referrer.as_ref().map_or(String::new(), |referrer| format!(" from \"{referrer}\""))
  )]
  ImportPrefixMissing {
    specifier: String,
    maybe_referrer: Option<String>,
  },
  #[error(
    "Cannot resolve relative import \"{specifier}\" from non-file referrer \"{referrer}\""
  )]
  InvalidReferrer { specifier: String, referrer: String },
}

use ModuleResolutionError::*;

const BUILTIN_SCHEME_PREFIX: &str = "builtin://";

/// Rewrites a `file://` URL into the filesystem path it names. Anything that
/// does not parse as a file URL is returned untouched.
pub fn normalize_file_url(specifier: &str) -> Cow<'_, str> {
  if !specifier.starts_with("file://") {
    return Cow::Borrowed(specifier);
  }
  match Url::parse(specifier)
    .ok()
    .and_then(|url| url_to_file_path(&url).ok())
  {
    Some(path) => Cow::Owned(path.to_string_lossy().into_owned()),
    None => Cow::Borrowed(specifier),
  }
}

/// Derives the referrer for a dynamic import from the origin of the script
/// that issued it.
///
/// An empty origin means the import came from a context with no script
/// (a REPL line or a host-created function) and resolves against `"."`.
pub fn referrer_from_origin(origin: &str) -> String {
  if origin.is_empty() {
    return ".".to_string();
  }
  if let Some(builtin) = origin.strip_prefix(BUILTIN_SCHEME_PREFIX) {
    return builtin.to_string();
  }
  match Url::parse(origin) {
    Ok(url) if url.scheme() == "file" => match url_to_file_path(&url) {
      Ok(path) => path.to_string_lossy().into_owned(),
      Err(_) => url.path().to_string(),
    },
    Ok(url) => url.path().to_string(),
    Err(_) => origin.to_string(),
  }
}

/// The filesystem path of a `file:` origin, if it is one.
pub fn file_origin_path(origin: &str) -> Option<String> {
  let url = Url::parse(origin).ok()?;
  if url.scheme() != "file" {
    return None;
  }
  let path = url_to_file_path(&url).ok()?;
  Some(path.to_string_lossy().into_owned())
}

pub fn is_relative_specifier(specifier: &str) -> bool {
  specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolves `specifier` as a filesystem path.
///
/// Absolute paths are normalized, relative ones are joined onto the directory
/// of `referrer` (or the current directory when the referrer is `"."` or
/// empty). Specifiers with a URL scheme are returned verbatim.
pub fn resolve_import_path(
  specifier: &str,
  referrer: &str,
) -> Result<String, ModuleResolutionError> {
  let specifier = normalize_file_url(specifier);
  let path = Path::new(specifier.as_ref());
  if path.is_absolute() {
    return Ok(normalized_string(Cow::Borrowed(path)));
  }

  if !is_relative_specifier(&specifier) {
    if Url::parse(&specifier).is_ok() {
      return Ok(specifier.into_owned());
    }
    let maybe_referrer = if referrer.is_empty() {
      None
    } else {
      Some(referrer.to_string())
    };
    return Err(ImportPrefixMissing {
      specifier: specifier.into_owned(),
      maybe_referrer,
    });
  }

  let base = if referrer.is_empty() || referrer == "." {
    std::env::current_dir().unwrap_or_default()
  } else {
    let referrer = normalize_file_url(referrer);
    let referrer = Path::new(referrer.as_ref());
    if !referrer.is_absolute() {
      return Err(InvalidReferrer {
        specifier: specifier.into_owned(),
        referrer: referrer.to_string_lossy().into_owned(),
      });
    }
    referrer.parent().map(Path::to_path_buf).unwrap_or_default()
  };

  Ok(normalized_string(Cow::Owned(base.join(specifier.as_ref()))))
}

/// Lexically normalizes `path`, resolving `.` and `..` without touching the
/// filesystem.
fn normalized_string(path: Cow<'_, Path>) -> String {
  normalize_path(path).to_string_lossy().into_owned()
}
