// Copyright 2018-2026 the Deno authors. MIT license.

//! Mapping positions in generated code back to the original sources.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sourcemap::SourceMap;

/// Outcome of remapping a zero-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMapApplication {
  /// No mapping was applied.
  Unchanged,
  /// Line and column were changed.
  LineAndColumn { line_number: u32, column_number: u32 },
  /// Line, column and file name were changed.
  LineAndColumnAndFileName {
    file_name: String,
    line_number: u32,
    column_number: u32,
  },
}

/// Maps a zero-based position in `file_name` to its original location.
pub trait SourceRemapper {
  fn remap(
    &self,
    file_name: &str,
    line_number: u32,
    column_number: u32,
  ) -> SourceMapApplication;
}

impl<F> SourceRemapper for F
where
  F: Fn(&str, u32, u32) -> SourceMapApplication,
{
  fn remap(
    &self,
    file_name: &str,
    line_number: u32,
    column_number: u32,
  ) -> SourceMapApplication {
    self(file_name, line_number, column_number)
  }
}

pub trait SourceMapGetter {
  /// Returns the raw source map file.
  fn get_source_map(&self, file_name: &str) -> Option<Cow<'_, [u8]>>;
}

impl SourceMapGetter for HashMap<String, Vec<u8>> {
  fn get_source_map(&self, file_name: &str) -> Option<Cow<'_, [u8]>> {
    self.get(file_name).map(|map| Cow::Borrowed(map.as_slice()))
  }
}

/// Cached filename lookups. The value is `None` if a previous lookup failed
/// to find or parse a source map.
type CachedMaps = HashMap<String, Option<Rc<SourceMap>>>;

/// A [`SourceRemapper`] backed by source maps handed out by a
/// [`SourceMapGetter`].
pub struct SourceMapper<G: SourceMapGetter> {
  maps: RefCell<CachedMaps>,
  getter: G,
}

impl<G: SourceMapGetter> SourceMapper<G> {
  pub fn new(getter: G) -> Self {
    Self {
      maps: Default::default(),
      getter,
    }
  }

  fn source_map(&self, file_name: &str) -> Option<Rc<SourceMap>> {
    if let Some(maybe_map) = self.maps.borrow().get(file_name) {
      return maybe_map.clone();
    }
    let maybe_map = self
      .getter
      .get_source_map(file_name)
      .and_then(|raw| match SourceMap::from_slice(&raw) {
        Ok(map) => Some(Rc::new(map)),
        Err(err) => {
          log::debug!("failed to parse source map for {file_name}: {err}");
          None
        }
      });
    self
      .maps
      .borrow_mut()
      .insert(file_name.to_string(), maybe_map.clone());
    maybe_map
  }
}

impl<G: SourceMapGetter> SourceRemapper for SourceMapper<G> {
  fn remap(
    &self,
    file_name: &str,
    line_number: u32,
    column_number: u32,
  ) -> SourceMapApplication {
    let Some(source_map) = self.source_map(file_name) else {
      return SourceMapApplication::Unchanged;
    };
    let Some(token) = source_map.lookup_token(line_number, column_number)
    else {
      return SourceMapApplication::Unchanged;
    };

    let line_number = token.get_src_line();
    let column_number = token.get_src_col();
    match token.get_source() {
      Some(source_file_name) if source_file_name != file_name => {
        SourceMapApplication::LineAndColumnAndFileName {
          file_name: source_file_name.to_string(),
          line_number,
          column_number,
        }
      }
      _ => SourceMapApplication::LineAndColumn {
        line_number,
        column_number,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // Generated line 2 maps to line 1 of "file:///src/app.ts"; generated
  // line 3 maps to line 6, column 2.
  const SOURCE_MAP: &str = r#"{
    "version": 3,
    "sources": ["file:///src/app.ts"],
    "names": [],
    "mappings": ";;AAAA;AAKE"
  }"#;

  struct CountingGetter {
    calls: RefCell<usize>,
  }

  impl SourceMapGetter for CountingGetter {
    fn get_source_map(&self, file_name: &str) -> Option<Cow<'_, [u8]>> {
      *self.calls.borrow_mut() += 1;
      if file_name == "/out/app.js" {
        Some(Cow::Borrowed(SOURCE_MAP.as_bytes()))
      } else {
        None
      }
    }
  }

  #[test]
  fn remaps_through_source_map() {
    let mapper = SourceMapper::new(CountingGetter {
      calls: RefCell::new(0),
    });
    assert_eq!(
      mapper.remap("/out/app.js", 2, 7),
      SourceMapApplication::LineAndColumnAndFileName {
        file_name: "file:///src/app.ts".to_string(),
        line_number: 0,
        column_number: 0,
      }
    );
    assert_eq!(
      mapper.remap("/out/app.js", 3, 0),
      SourceMapApplication::LineAndColumnAndFileName {
        file_name: "file:///src/app.ts".to_string(),
        line_number: 5,
        column_number: 2,
      }
    );
    assert_eq!(
      mapper.remap("/out/other.js", 3, 0),
      SourceMapApplication::Unchanged
    );
    assert_eq!(
      mapper.remap("/out/other.js", 4, 0),
      SourceMapApplication::Unchanged
    );
    // One lookup per file name.
    assert_eq!(*mapper.getter.calls.borrow(), 2);
  }

  #[test]
  fn invalid_source_map_is_ignored() {
    let mut maps = HashMap::new();
    maps.insert("/out/app.js".to_string(), b"not json".to_vec());
    let mapper = SourceMapper::new(maps);
    assert_eq!(
      mapper.remap("/out/app.js", 0, 0),
      SourceMapApplication::Unchanged
    );
  }

  #[test]
  fn closures_are_remappers() {
    let remapper = |_: &str, line: u32, column: u32| {
      SourceMapApplication::LineAndColumn {
        line_number: line + 1,
        column_number: column,
      }
    };
    assert_eq!(
      remapper.remap("/a.js", 1, 2),
      SourceMapApplication::LineAndColumn {
        line_number: 2,
        column_number: 2,
      }
    );
  }
}
