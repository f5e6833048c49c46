//! Breadth-first simulation of npm's `node_modules` layout.
//!
//! Placements live in an arena keyed by location. Every queued visit carries
//! the classification of the path that produced it and that path's ancestry,
//! so flag joins can be re-propagated and cycles cut without global state.

use super::ConvertWarning;
use crate::graph::{DependencyKind, DependencyTarget, Importer, LockGraph, PackageId, PeerRequirement};
use crate::{ConvertError, Result, location};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

/// Why an entry is present. Along a path the flags accumulate, across paths
/// they are joined, so `dev` survives only if every path to the entry is a
/// development path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub dev: bool,
    pub optional: bool,
    pub peer: bool,
    dev_or_optional: bool,
}

impl Flags {
    pub const NONE: Flags = Flags {
        dev: false,
        optional: false,
        peer: false,
        dev_or_optional: false,
    };

    pub const DEV: Flags = Flags {
        dev: true,
        optional: false,
        peer: false,
        dev_or_optional: true,
    };

    pub const OPTIONAL: Flags = Flags {
        dev: false,
        optional: true,
        peer: false,
        dev_or_optional: true,
    };

    pub fn along(self, kind: DependencyKind) -> Flags {
        let mut next = self;
        match kind {
            DependencyKind::Regular => {}
            DependencyKind::Optional => next.optional = true,
            DependencyKind::Peer => next.peer = true,
        }
        next.dev_or_optional = self.dev_or_optional || next.dev || next.optional;
        next
    }

    pub fn join(self, other: Flags) -> Flags {
        Flags {
            dev: self.dev && other.dev,
            optional: self.optional && other.optional,
            peer: self.peer && other.peer,
            dev_or_optional: self.dev_or_optional && other.dev_or_optional,
        }
    }

    /// npm's `devOptional`: every path is a dev or an optional path, but
    /// neither kind alone covers them all.
    pub fn dev_optional(self) -> bool {
        self.dev_or_optional && !self.dev && !self.optional
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Placement<'g> {
    pub occupant: &'g DependencyTarget,
    pub flags: Flags,
}

/// One package on the path that led to a visit.
struct Frame<'g> {
    id: &'g PackageId,
    location: String,
    depth: usize,
    parent: Option<Rc<Frame<'g>>>,
}

struct Visit<'g> {
    /// Location of the dependent: an importer or a placed package.
    from: String,
    name: &'g str,
    /// `None` for a peer pnpm left unresolved.
    target: Option<&'g DependencyTarget>,
    kind: DependencyKind,
    peer: Option<&'g PeerRequirement>,
    flags: Flags,
    ancestry: Option<Rc<Frame<'g>>>,
}

impl Visit<'_> {
    fn depth(&self) -> usize {
        self.ancestry.as_ref().map_or(0, |frame| frame.depth)
    }

    fn dependent(&self) -> String {
        match &self.ancestry {
            Some(frame) => frame.id.to_string(),
            None if self.from.is_empty() => "the root project".to_string(),
            None => format!("importer {}", self.from),
        }
    }

    fn chain(&self) -> String {
        let mut ids = Vec::new();
        let mut frame = self.ancestry.as_deref();

        while let Some(current) = frame {
            ids.push(current.id.to_string());
            frame = current.parent.as_deref();
        }

        ids.reverse();
        ids.push(self.name.to_string());
        ids.join(" > ")
    }

    fn is_on_path(&self, id: &PackageId, location: &str) -> bool {
        let mut frame = self.ancestry.as_deref();

        while let Some(current) = frame {
            if current.id == id && current.location == location {
                return true;
            }
            frame = current.parent.as_deref();
        }

        false
    }
}

enum Slot {
    Existing(String),
    Vacant(String),
    Taken(String),
}

pub struct Tree<'g> {
    graph: &'g LockGraph,
    max_depth: usize,
    queue: VecDeque<Visit<'g>>,
    placements: BTreeMap<String, Placement<'g>>,
    /// Dependency name → (dependent location, what it resolved to).
    wanted: BTreeMap<&'g str, Vec<(String, &'g DependencyTarget)>>,
    warnings: Vec<ConvertWarning>,
}

impl<'g> Tree<'g> {
    pub fn new(graph: &'g LockGraph, max_depth: usize) -> Self {
        Tree {
            graph,
            max_depth,
            queue: VecDeque::new(),
            placements: BTreeMap::new(),
            wanted: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Queues the direct dependencies of every importer, in order, ahead of
    /// any transitive dependency.
    pub fn seed(&mut self, importers: &'g [Importer]) {
        for importer in importers {
            let sections = [
                (&importer.dependencies, DependencyKind::Regular, Flags::NONE),
                (&importer.dev_dependencies, DependencyKind::Regular, Flags::DEV),
                (
                    &importer.optional_dependencies,
                    DependencyKind::Optional,
                    Flags::OPTIONAL,
                ),
            ];

            for (specifiers, kind, flags) in sections {
                for specifier in specifiers {
                    self.queue.push_back(Visit {
                        from: importer.location.clone(),
                        name: &specifier.name,
                        target: Some(&specifier.target),
                        kind,
                        peer: None,
                        flags,
                        ancestry: None,
                    });
                }
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        while let Some(visit) = self.queue.pop_front() {
            self.visit(visit)?;
        }

        Ok(())
    }

    pub fn finish(self) -> (BTreeMap<String, Placement<'g>>, Vec<ConvertWarning>) {
        (self.placements, self.warnings)
    }

    fn visit(&mut self, visit: Visit<'g>) -> Result<()> {
        if visit.depth() >= self.max_depth {
            if visit.kind == DependencyKind::Regular {
                return Err(ConvertError::CyclicHardDependency {
                    chain: visit.chain(),
                    depth: self.max_depth,
                });
            }

            self.warnings.push(ConvertWarning::DepthLimitExceeded {
                location: visit.from.clone(),
                name: visit.name.to_string(),
                depth: self.max_depth,
            });
            return Ok(());
        }

        if visit.kind == DependencyKind::Peer {
            return self.visit_peer(visit);
        }

        let Some(target) = visit.target else {
            return Ok(());
        };

        let start = visit.from.clone();
        self.place(visit, target, &start);
        Ok(())
    }

    fn visit_peer(&mut self, visit: Visit<'g>) -> Result<()> {
        let range = visit.peer.map_or("*", |peer| peer.range.as_str());
        let found = self
            .resolve(&visit.from, visit.name)
            .map(|location| (location.clone(), self.placements[location].occupant));

        if let Some((location, occupant)) = &found
            && (visit.target == Some(*occupant) || satisfies(occupant, range))
        {
            self.merge(location.clone(), *occupant, &visit);
            return Ok(());
        }

        let found_version = found.as_ref().map(|(_, occupant)| describe(occupant));

        if let Some(target) = visit.target
            && let Some(start) = location::parent(&visit.from)
        {
            let start = start.to_string();
            self.place(visit, target, &start);
            return Ok(());
        }

        if !visit.peer.is_some_and(|peer| peer.optional) {
            self.warnings.push(ConvertWarning::UnresolvedPeerDependency {
                dependent: visit.dependent(),
                location: visit.from.clone(),
                peer: visit.name.to_string(),
                range: range.to_string(),
                found: found_version,
            });
        }

        Ok(())
    }

    /// Places or dedupes `target` for `visit`, walking up from the scope
    /// owned by `start`.
    fn place(&mut self, visit: Visit<'g>, target: &'g DependencyTarget, start: &str) {
        match self.locate(visit.name, target, start) {
            Slot::Existing(location) => {
                self.merge(location, target, &visit);
            }
            Slot::Vacant(location) => {
                self.insert(location, target, visit);
            }
            Slot::Taken(location) => {
                let existing = describe(self.placements[&location].occupant);

                if visit.kind == DependencyKind::Peer {
                    let range = visit.peer.map_or("*", |peer| peer.range.as_str());
                    self.warnings.push(ConvertWarning::UnresolvedPeerDependency {
                        dependent: visit.dependent(),
                        location: visit.from.clone(),
                        peer: visit.name.to_string(),
                        range: range.to_string(),
                        found: Some(existing),
                    });
                } else {
                    self.warnings.push(ConvertWarning::PlacementConflict {
                        location,
                        wanted: describe(target),
                        existing,
                    });
                }
            }
        }
    }

    fn locate(&self, name: &str, target: &DependencyTarget, start: &str) -> Slot {
        let mut candidate: Option<String> = None;
        let mut owner = Some(start);

        while let Some(current) = owner {
            let location = location::child(current, name);

            match self.placements.get(&location) {
                Some(placed) if placed.occupant == target => return Slot::Existing(location),
                Some(_) => break,
                None => {
                    if candidate.is_some() && self.shadows(current, name, target) {
                        break;
                    }
                    candidate = Some(location);
                }
            }

            owner = location::parent(current);
        }

        match candidate {
            Some(location) => Slot::Vacant(location),
            None => Slot::Taken(location::child(start, name)),
        }
    }

    /// Whether putting `target` into the scope owned by `owner` would hide a
    /// different version that some dependent below `owner` already resolves
    /// from further up.
    fn shadows(&self, owner: &str, name: &str, target: &DependencyTarget) -> bool {
        let Some(wanted) = self.wanted.get(name) else {
            return false;
        };

        wanted.iter().any(|(dependent, resolved)| {
            *resolved != target
                && location::is_within(dependent, owner)
                && self.resolve(dependent, name).is_some_and(|found| {
                    !location::is_within(location::parent(found).unwrap_or(""), owner)
                })
        })
    }

    /// Node's lookup: the nearest `node_modules/<name>` walking up from `from`.
    pub fn resolve(&self, from: &str, name: &str) -> Option<&String> {
        let mut owner = Some(from);

        while let Some(current) = owner {
            if let Some((location, _)) = self
                .placements
                .get_key_value(&location::child(current, name))
            {
                return Some(location);
            }
            owner = location::parent(current);
        }

        None
    }

    fn insert(&mut self, location: String, target: &'g DependencyTarget, visit: Visit<'g>) {
        self.want(&visit.from, visit.name, target);
        self.placements.insert(
            location.clone(),
            Placement {
                occupant: target,
                flags: visit.flags,
            },
        );

        if let DependencyTarget::Package(id) = target {
            self.enqueue_children(id, location, visit.flags, visit.ancestry);
        }
    }

    fn merge(&mut self, location: String, target: &'g DependencyTarget, visit: &Visit<'g>) {
        self.want(&visit.from, visit.name, target);

        if let DependencyTarget::Package(id) = target
            && visit.is_on_path(id, &location)
        {
            return;
        }

        let Some(placed) = self.placements.get_mut(&location) else {
            return;
        };

        let joined = placed.flags.join(visit.flags);
        if joined == placed.flags {
            return;
        }
        placed.flags = joined;

        if let DependencyTarget::Package(id) = target {
            self.enqueue_children(id, location, joined, visit.ancestry.clone());
        }
    }

    fn want(&mut self, from: &str, name: &'g str, target: &'g DependencyTarget) {
        let wanted = self.wanted.entry(name).or_default();

        if !wanted
            .iter()
            .any(|(dependent, resolved)| dependent == from && *resolved == target)
        {
            wanted.push((from.to_string(), target));
        }
    }

    fn enqueue_children(
        &mut self,
        id: &'g PackageId,
        location: String,
        flags: Flags,
        ancestry: Option<Rc<Frame<'g>>>,
    ) {
        let Some(package) = self.graph.package(id) else {
            return;
        };

        let depth = ancestry.as_ref().map_or(0, |frame| frame.depth) + 1;
        let frame = Rc::new(Frame {
            id,
            location: location.clone(),
            depth,
            parent: ancestry,
        });

        for kind in [
            DependencyKind::Regular,
            DependencyKind::Optional,
            DependencyKind::Peer,
        ] {
            for edge in package.edges_of(kind) {
                self.queue.push_back(Visit {
                    from: location.clone(),
                    name: &edge.name,
                    target: Some(&edge.target),
                    kind,
                    peer: package.peer_dependencies.get(&edge.name),
                    flags: flags.along(kind),
                    ancestry: Some(frame.clone()),
                });
            }
        }

        for (name, requirement) in package.peer_dependencies.iter() {
            if package.edge(name).is_some() {
                continue;
            }

            self.queue.push_back(Visit {
                from: location.clone(),
                name,
                target: None,
                kind: DependencyKind::Peer,
                peer: Some(requirement),
                flags: flags.along(DependencyKind::Peer),
                ancestry: Some(frame.clone()),
            });
        }
    }
}

fn satisfies(occupant: &DependencyTarget, range: &str) -> bool {
    match occupant {
        DependencyTarget::Package(id) => pnpm2npm_semver::satisfies(&id.version, range),
        DependencyTarget::Link(_) => true,
    }
}

fn describe(target: &DependencyTarget) -> String {
    match target {
        DependencyTarget::Package(id) => id.to_string(),
        DependencyTarget::Link(path) => format!("link:{path}"),
    }
}
