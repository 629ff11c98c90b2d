use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::calendar::Locale;
use crate::datetime::CalendarDate;

const RC_ENV_VAR: &str = "ACADEMYRC";
const RC_FILE_NAME: &str = ".academyrc";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "default.command".to_string(),
      "month".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "calendar.locale".to_string(),
      "pt-BR".to_string()
    );
    map.insert(
      "upcoming.limit".to_string(),
      "3".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(academyrc = %path.display(), "loading academyrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no academyrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_usize(
    &self,
    key: &str
  ) -> anyhow::Result<Option<usize>> {
    self
      .map
      .get(key)
      .map(|raw| {
        raw.trim().parse::<usize>().map_err(
          |e| {
            anyhow!(
              "invalid {key} = {raw}: {e}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn locale(
    &self
  ) -> anyhow::Result<Locale> {
    self
      .get("calendar.locale")
      .map(|raw| raw.parse::<Locale>())
      .transpose()
      .map(|locale| {
        locale.unwrap_or(Locale::PtBr)
      })
  }

  /// A pinned "today", mostly useful
  /// for demos and reproducible output.
  pub fn pinned_today(
    &self
  ) -> anyhow::Result<Option<CalendarDate>>
  {
    self
      .get("calendar.today")
      .filter(|raw| !raw.trim().is_empty())
      .map(|raw| {
        CalendarDate::parse_iso(&raw)
          .context(
            "invalid calendar.today"
          )
      })
      .transpose()
  }

  /// Seed file named by
  /// `data.location`, if any.
  pub fn seed_path(
    &self
  ) -> Option<PathBuf> {
    self
      .get("data.location")
      .filter(|raw| !raw.trim().is_empty())
      .map(|raw| {
        expand_tilde(Path::new(
          raw.trim()
        ))
      })
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if self
          .loaded_files
          .contains(&include_path)
        {
          warn!(include = %include_path.display(), "include cycle; skipping");
        } else if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping academyrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::Config;
  use crate::calendar::Locale;

  #[test]
  fn loads_file_with_comments_and_include() {
    let dir = tempdir().expect("tempdir");
    fs::write(
      dir.path().join("extra.rc"),
      "calendar.locale = en\n"
    )
    .expect("write include");
    let rc = dir.path().join("academyrc");
    fs::write(
      &rc,
      "# student settings\n\
       color = off # no ansi\n\
       upcoming.limit=5\n\
       include extra.rc\n"
    )
    .expect("write rc");

    let cfg =
      Config::load(Some(rc.as_path())).expect("load");
    assert_eq!(cfg.get_bool("color"), Some(false));
    assert_eq!(
      cfg.get_usize("upcoming.limit").expect("usize"),
      Some(5)
    );
    assert_eq!(
      cfg.locale().expect("locale"),
      Locale::En
    );
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.get("default.command").as_deref(),
      Some("month")
    );
  }

  #[test]
  fn rejects_lines_without_equals() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("academyrc");
    fs::write(&rc, "color on\n").expect("write rc");
    assert!(Config::load(Some(rc.as_path())).is_err());
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![
      (
        "rc.calendar.today".to_string(),
        "2024-06-15".to_string()
      ),
      (
        "data.location".to_string(),
        "/tmp/seed.toml".to_string()
      ),
    ]);
    assert_eq!(
      cfg
        .pinned_today()
        .expect("today")
        .map(|d| d.to_iso()),
      Some("2024-06-15".to_string())
    );
    assert_eq!(
      cfg.seed_path(),
      Some(std::path::PathBuf::from(
        "/tmp/seed.toml"
      ))
    );
  }

  #[test]
  fn invalid_values_are_errors() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![
      (
        "calendar.today".to_string(),
        "2024-02-30".to_string()
      ),
      (
        "upcoming.limit".to_string(),
        "many".to_string()
      ),
    ]);
    assert!(cfg.pinned_today().is_err());
    assert!(cfg.get_usize("upcoming.limit").is_err());
  }
}
