use crate::{ConvertError, Result};

/// The `pnpm-lock.yaml` layouts this crate understands. They differ in how
/// package keys and dependency references are spelled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockfileFormat {
    /// `/name/1.0.0_peer@1.0.0`
    V5,
    /// `/name@1.0.0(peer@1.0.0)`
    V6,
    /// `name@1.0.0(peer@1.0.0)`, metadata split into `packages` and `snapshots`
    V9,
}

impl LockfileFormat {
    pub fn detect(version: &str) -> Result<Self> {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok())
            .ok_or_else(|| {
                ConvertError::malformed(format!("lockfileVersion {version:?} is not a number"))
            })?;

        match major {
            5 => Ok(LockfileFormat::V5),
            6 => Ok(LockfileFormat::V6),
            9 => Ok(LockfileFormat::V9),
            _ => Err(ConvertError::malformed(format!(
                "unsupported lockfileVersion {version}, expected 5.x, 6.x or 9.x"
            ))),
        }
    }

    /// Splits a package key into name and version, dropping any peer suffix.
    pub fn parse_key(self, key: &str) -> Option<(String, String)> {
        match self {
            LockfileFormat::V5 => {
                let path = key.strip_prefix('/')?;
                let (name, rest) = path.rsplit_once('/')?;
                let version = rest.split('_').next().unwrap_or(rest);
                non_empty(name, version)
            }
            LockfileFormat::V6 => {
                let path = key.strip_prefix('/')?;
                split_name_version(strip_peer_suffix(path))
            }
            LockfileFormat::V9 => split_name_version(strip_peer_suffix(key)),
        }
    }

    /// Maps a dependency reference (the value side of `name: reference`) to
    /// the package key it points at.
    pub fn reference_key(self, name: &str, reference: &str) -> String {
        match self {
            LockfileFormat::V5 => {
                if reference.contains('/') {
                    reference.to_string()
                } else {
                    format!("/{name}/{reference}")
                }
            }
            LockfileFormat::V6 => {
                if strip_peer_suffix(reference).contains('/') {
                    reference.to_string()
                } else {
                    format!("/{name}@{reference}")
                }
            }
            LockfileFormat::V9 => {
                let head = strip_peer_suffix(reference);
                if head.rfind('@').is_some_and(|idx| idx > 0) && !head.contains(':') {
                    reference.to_string()
                } else {
                    format!("{name}@{reference}")
                }
            }
        }
    }

    /// The key of the same package without its peer suffix.
    pub fn base_key(self, key: &str) -> &str {
        match self {
            LockfileFormat::V5 => match key.rfind('/') {
                Some(slash) => match key[slash..].find('_') {
                    Some(underscore) => &key[..slash + underscore],
                    None => key,
                },
                None => key,
            },
            LockfileFormat::V6 | LockfileFormat::V9 => strip_peer_suffix(key),
        }
    }
}

fn strip_peer_suffix(value: &str) -> &str {
    match value.find('(') {
        Some(idx) => &value[..idx],
        None => value,
    }
}

fn split_name_version(path: &str) -> Option<(String, String)> {
    let idx = path.rfind('@').filter(|idx| *idx > 0)?;
    non_empty(&path[..idx], &path[idx + 1..])
}

fn non_empty(name: &str, version: &str) -> Option<(String, String)> {
    if name.is_empty() || version.is_empty() {
        None
    } else {
        Some((name.to_string(), version.to_string()))
    }
}
