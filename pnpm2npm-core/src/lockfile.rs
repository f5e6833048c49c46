//! Decodes `pnpm-lock.yaml` text into a [`LockGraph`].

mod format;
mod raw;

pub use format::LockfileFormat;

use crate::graph::{
    DependencyKind, DependencyTarget, Edge, Importer, LockGraph, PackageId, PackageNode,
    PeerRequirement, Resolution, Specifier,
};
use crate::{ConvertError, Result, integrity, location};
use indexmap::IndexMap;
use raw::{RawImporter, RawLockfile, RawPackage, RawReference, RawResolution, ScalarMap};
use std::collections::{BTreeMap, HashMap};

pub const FILE_NAME: &str = "pnpm-lock.yaml";

pub fn parse(text: &str) -> Result<LockGraph> {
    let mut raw: RawLockfile =
        serde_yaml::from_str(text).map_err(|err| ConvertError::malformed(err.to_string()))?;

    let version = raw
        .lockfile_version
        .take()
        .ok_or_else(|| ConvertError::malformed("lockfileVersion is missing"))?
        .0;
    let format = LockfileFormat::detect(&version)?;

    let raw_importers = match raw.importers.take() {
        Some(importers) => importers,
        None => IndexMap::from([(".".to_string(), raw.take_root_importer())]),
    };

    let nodes = collect_nodes(format, &raw)?;
    let ids: HashMap<&str, &PackageId> = nodes
        .iter()
        .flat_map(|node| {
            [
                (node.key.as_str(), &node.id),
                (format.base_key(&node.key), &node.id),
            ]
        })
        .collect();

    let mut packages: BTreeMap<PackageId, PackageNode> = BTreeMap::new();

    for node in nodes.iter() {
        let dependent = node.id.to_string();
        let mut edges = Vec::new();

        for (name, reference) in node.dependencies.iter() {
            let kind = if node.peer_dependencies.contains_key(name) {
                DependencyKind::Peer
            } else {
                DependencyKind::Regular
            };
            let target = resolve_target(format, &ids, "", &dependent, name, reference.as_str())?;
            edges.push(Edge {
                name: name.clone(),
                target,
                kind,
            });
        }

        for (name, reference) in node.optional_dependencies.iter() {
            if edges.iter().any(|edge| &edge.name == name) {
                continue;
            }
            let target = resolve_target(format, &ids, "", &dependent, name, reference.as_str())?;
            edges.push(Edge {
                name: name.clone(),
                target,
                kind: DependencyKind::Optional,
            });
        }

        match packages.get_mut(&node.id) {
            Some(existing) => {
                for edge in edges {
                    if existing.edge(&edge.name).is_none() {
                        existing.edges.push(edge);
                    }
                }
            }
            None => {
                let package = build_package(node, edges)?;
                packages.insert(node.id.clone(), package);
            }
        }
    }

    let mut importers = Vec::with_capacity(raw_importers.len());

    for (path, importer) in raw_importers.iter() {
        importers.push(build_importer(format, &ids, path, importer)?);
    }

    if let Some(root) = importers.iter().position(Importer::is_root) {
        let root = importers.remove(root);
        importers.insert(0, root);
    }

    Ok(LockGraph {
        lockfile_version: version,
        importers,
        packages,
    })
}

/// One package instance as listed in the lockfile, before peer variants of
/// the same `name@version` are collapsed.
struct NodeSource<'a> {
    key: String,
    id: PackageId,
    meta: &'a RawPackage,
    dependencies: &'a ScalarMap,
    optional_dependencies: &'a ScalarMap,
    peer_dependencies: &'a ScalarMap,
}

fn collect_nodes(format: LockfileFormat, raw: &RawLockfile) -> Result<Vec<NodeSource<'_>>> {
    let mut nodes = Vec::new();

    match format {
        LockfileFormat::V5 | LockfileFormat::V6 => {
            for (key, package) in raw.packages.iter() {
                nodes.push(NodeSource {
                    key: key.clone(),
                    id: package_id(format, key, package)?,
                    meta: package,
                    dependencies: &package.dependencies,
                    optional_dependencies: &package.optional_dependencies,
                    peer_dependencies: &package.peer_dependencies,
                });
            }
        }
        LockfileFormat::V9 => {
            for (key, snapshot) in raw.snapshots.iter() {
                let base = format.base_key(key);
                let package = raw.packages.get(base).ok_or_else(|| {
                    ConvertError::MissingResolution {
                        package: key.clone(),
                        reason: format!("snapshot has no matching `packages` entry {base:?}"),
                    }
                })?;

                nodes.push(NodeSource {
                    key: key.clone(),
                    id: package_id(format, key, package)?,
                    meta: package,
                    dependencies: &snapshot.dependencies,
                    optional_dependencies: &snapshot.optional_dependencies,
                    peer_dependencies: &package.peer_dependencies,
                });
            }
        }
    }

    Ok(nodes)
}

fn package_id(format: LockfileFormat, key: &str, package: &RawPackage) -> Result<PackageId> {
    let parsed = format.parse_key(key);

    let name = package
        .name
        .clone()
        .or_else(|| parsed.as_ref().map(|(name, _)| name.clone()));
    let version = package
        .version
        .as_ref()
        .map(|version| version.0.clone())
        .or_else(|| parsed.as_ref().map(|(_, version)| version.clone()));

    match (name, version) {
        (Some(name), Some(version)) => Ok(PackageId { name, version }),
        (None, _) => Err(ConvertError::MissingResolution {
            package: key.to_string(),
            reason: "package name cannot be derived from the key or a `name` field".into(),
        }),
        (_, None) => Err(ConvertError::MissingResolution {
            package: key.to_string(),
            reason: "resolved version cannot be derived from the key or a `version` field".into(),
        }),
    }
}

fn build_package(node: &NodeSource<'_>, edges: Vec<Edge>) -> Result<PackageNode> {
    let meta = node.meta;
    let resolution = build_resolution(&node.key, meta.resolution.as_ref())?;

    let peer_dependencies = node
        .peer_dependencies
        .iter()
        .map(|(name, range)| {
            let optional = meta
                .peer_dependencies_meta
                .get(name)
                .is_some_and(|peer| peer.optional);
            let requirement = PeerRequirement {
                range: range.0.clone(),
                optional,
            };
            (name.clone(), requirement)
        })
        .collect();

    Ok(PackageNode {
        id: node.id.clone(),
        resolution,
        edges,
        peer_dependencies,
        os: meta.os.clone(),
        cpu: meta.cpu.clone(),
        engines: meta
            .engines
            .iter()
            .map(|(engine, range)| (engine.clone(), range.0.clone()))
            .collect(),
        requires_build: meta.requires_build,
        has_bin: meta.has_bin,
        deprecated: meta.deprecated.clone(),
    })
}

fn build_resolution(key: &str, resolution: Option<&RawResolution>) -> Result<Resolution> {
    let missing = |reason: &str| ConvertError::MissingResolution {
        package: key.to_string(),
        reason: reason.to_string(),
    };

    let resolution = resolution.ok_or_else(|| missing("`resolution` is missing"))?;

    let checked_integrity = |value: &Option<String>| -> Result<Option<String>> {
        match value {
            Some(value) => {
                integrity::validate(value).map_err(|reason| missing(&reason))?;
                Ok(Some(value.clone()))
            }
            None => Ok(None),
        }
    };

    match resolution.kind.as_deref() {
        Some("git") => {
            let repo = resolution
                .repo
                .clone()
                .ok_or_else(|| missing("git resolution has no `repo`"))?;
            let commit = resolution
                .commit
                .clone()
                .ok_or_else(|| missing("git resolution has no `commit`"))?;
            Ok(Resolution::Git { repo, commit })
        }
        Some("directory") => {
            let directory = resolution
                .directory
                .clone()
                .ok_or_else(|| missing("directory resolution has no `directory`"))?;
            Ok(Resolution::Directory { directory })
        }
        _ => {
            let integrity = checked_integrity(&resolution.integrity)?;

            match (resolution.tarball.clone(), integrity) {
                (Some(tarball), integrity) => Ok(Resolution::Tarball { tarball, integrity }),
                (None, Some(integrity)) => Ok(Resolution::Registry { integrity }),
                (None, None) => Err(missing("registry resolution has no `integrity`")),
            }
        }
    }
}

fn build_importer(
    format: LockfileFormat,
    ids: &HashMap<&str, &PackageId>,
    path: &str,
    importer: &RawImporter,
) -> Result<Importer> {
    let location = location::importer_location(path);
    let dependent = if location.is_empty() {
        "the root project".to_string()
    } else {
        format!("importer {location}")
    };

    let specifiers = |section: &IndexMap<String, RawReference>| -> Result<Vec<Specifier>> {
        section
            .iter()
            .map(|(name, reference)| {
                let requested = reference
                    .specifier()
                    .or_else(|| importer.specifiers.get(name).map(|s| s.as_str()))
                    .unwrap_or_else(|| reference.version())
                    .to_string();
                let target = resolve_target(
                    format,
                    ids,
                    &location,
                    &dependent,
                    name,
                    reference.version(),
                )?;

                Ok(Specifier {
                    name: name.clone(),
                    requested,
                    target,
                })
            })
            .collect()
    };

    Ok(Importer {
        dependencies: specifiers(&importer.dependencies)?,
        dev_dependencies: specifiers(&importer.dev_dependencies)?,
        optional_dependencies: specifiers(&importer.optional_dependencies)?,
        location,
    })
}

fn resolve_target(
    format: LockfileFormat,
    ids: &HashMap<&str, &PackageId>,
    base: &str,
    dependent: &str,
    name: &str,
    reference: &str,
) -> Result<DependencyTarget> {
    if let Some(path) = reference.strip_prefix("link:") {
        return Ok(DependencyTarget::Link(location::join(base, path)));
    }

    let key = format.reference_key(name, reference);

    ids.get(key.as_str())
        .or_else(|| ids.get(format.base_key(&key)))
        .map(|id| DependencyTarget::Package((*id).clone()))
        .ok_or_else(|| ConvertError::DanglingDependency {
            dependent: dependent.to_string(),
            name: name.to_string(),
            reference: reference.to_string(),
        })
}
