//! In-process archive backend.
//!
//! [`MemoryArchive`] keeps every object, shape and sample it is given, plus
//! an ordered log of the calls that produced them. Contexts are never
//! reused: a destroyed context keeps its record (so it can be inspected
//! after the session ends) but rejects further calls.
//!
//! Failures can be injected per operation to exercise the error paths of
//! a recording session.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{
    ArchiveBackend, CameraHandle, CameraSampleData, ContextHandle, MeshHandle, NodeHandle,
    PolyMeshSampleData, XformHandle, XformSampleData,
};
use crate::config::ArchiveConfig;
use crate::util::{Error, Result, Vec3};

/// One backend call, in the order it was made.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ArchiveCall {
    CreateContext(Option<ContextHandle>),
    DestroyContext(ContextHandle),
    OpenArchive { context: ContextHandle, path: PathBuf, ok: bool },
    RootObject(ContextHandle),
    CreateObject { parent: NodeHandle, name: String },
    AddXform(NodeHandle),
    AddCamera(NodeHandle),
    AddPolyMesh(NodeHandle),
    WriteXform(XformHandle),
    WriteCamera(CameraHandle),
    WritePolyMesh(MeshHandle),
    SetTime { context: ContextHandle, time: f64 },
}

impl ArchiveCall {
    /// True for calls that push a sample.
    pub fn is_sample_write(&self) -> bool {
        matches!(self, Self::WriteXform(_) | Self::WriteCamera(_) | Self::WritePolyMesh(_))
    }

    /// Node a call targets, if any.
    pub fn node(&self) -> Option<NodeHandle> {
        match self {
            Self::CreateObject { parent, .. } => Some(*parent),
            Self::AddXform(n) | Self::AddCamera(n) | Self::AddPolyMesh(n) => Some(*n),
            Self::WriteXform(h) => Some(h.0),
            Self::WriteCamera(h) => Some(h.0),
            Self::WritePolyMesh(h) => Some(h.0),
            _ => None,
        }
    }
}

/// Shape attached to an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ShapeKind {
    Xform,
    Camera,
    PolyMesh,
}

/// Stored sample payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SampleValue {
    Xform(XformSampleData),
    Camera(CameraSampleData),
    PolyMesh { positions: Vec<Vec3>, indices: Vec<u32> },
}

/// Sample stamped with the context time at write.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleRecord {
    pub time: f64,
    pub value: SampleValue,
}

/// Object in an archive hierarchy.
#[derive(Clone, Debug, Serialize)]
pub struct ObjectRecord {
    pub name: String,
    pub parent: Option<u32>,
    pub children: Vec<u32>,
    pub shape: Option<ShapeKind>,
    pub samples: Vec<SampleRecord>,
}

impl ObjectRecord {
    fn new(name: &str, parent: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            shape: None,
            samples: Vec::new(),
        }
    }
}

/// Everything written under one context.
#[derive(Clone, Debug, Serialize)]
pub struct ArchiveRecord {
    pub config: ArchiveConfig,
    pub path: Option<PathBuf>,
    /// False once the context was destroyed.
    pub live: bool,
    pub time: f64,
    /// Index 0 is the root once the archive is open.
    pub objects: Vec<ObjectRecord>,
}

impl ArchiveRecord {
    /// Resolve a `/`-separated object path from the root.
    pub fn find(&self, path: &str) -> Option<&ObjectRecord> {
        let mut current = self.objects.first()?;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let next = current
                .children
                .iter()
                .find(|&&c| self.objects[c as usize].name == part)?;
            current = &self.objects[*next as usize];
        }
        Some(current)
    }

    /// Total samples across all objects.
    pub fn sample_count(&self) -> usize {
        self.objects.iter().map(|o| o.samples.len()).sum()
    }
}

/// Injected failures.
#[derive(Clone, Debug, Default)]
pub struct FailurePlan {
    /// `create_context` returns `None`.
    pub refuse_context: bool,
    /// `open_archive` fails for these paths.
    pub reject_paths: Vec<PathBuf>,
    /// `create_object` fails once this many objects were created.
    pub objects_before_failure: Option<usize>,
    /// Sample writes fail once this many succeeded.
    pub writes_before_failure: Option<usize>,
}

/// Backend that keeps the whole archive in memory.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    archives: Vec<ArchiveRecord>,
    calls: Vec<ArchiveCall>,
    failures: FailurePlan,
    objects_created: usize,
    writes: usize,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with injected failures.
    pub fn with_failures(failures: FailurePlan) -> Self {
        Self { failures, ..Self::default() }
    }

    /// Mutable access to the failure plan.
    pub fn failures_mut(&mut self) -> &mut FailurePlan {
        &mut self.failures
    }

    /// Calls made so far.
    pub fn calls(&self) -> &[ArchiveCall] {
        &self.calls
    }

    /// Forget the call log (records are kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// All archives ever created, indexed by context.
    pub fn archives(&self) -> &[ArchiveRecord] {
        &self.archives
    }

    /// Record of a context.
    pub fn archive(&self, context: ContextHandle) -> Option<&ArchiveRecord> {
        self.archives.get(context.0 as usize)
    }

    /// Most recently created archive.
    pub fn last_archive(&self) -> Option<&ArchiveRecord> {
        self.archives.last()
    }

    /// Contexts not yet destroyed.
    pub fn live_contexts(&self) -> usize {
        self.archives.iter().filter(|a| a.live).count()
    }

    /// Number of `destroy_context` calls.
    pub fn destroy_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ArchiveCall::DestroyContext(_)))
            .count()
    }

    /// Number of successful sample writes.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Pretty JSON dump of one archive.
    pub fn snapshot_json(&self, context: ContextHandle) -> Result<String> {
        let record = self
            .archive(context)
            .ok_or_else(|| Error::handle(format!("unknown context {}", context.0)))?;
        Ok(serde_json::to_string_pretty(record)?)
    }

    fn live_archive(&mut self, context: ContextHandle) -> Result<&mut ArchiveRecord> {
        match self.archives.get_mut(context.0 as usize) {
            Some(record) if record.live => Ok(record),
            Some(_) => Err(Error::handle(format!("context {} was released", context.0))),
            None => Err(Error::handle(format!("unknown context {}", context.0))),
        }
    }

    fn object_mut(&mut self, node: NodeHandle) -> Result<&mut ObjectRecord> {
        let record = self.live_archive(node.context)?;
        record
            .objects
            .get_mut(node.index as usize)
            .ok_or_else(|| Error::handle(format!("unknown object {}", node.index)))
    }

    fn add_shape(&mut self, node: NodeHandle, kind: ShapeKind) -> Result<()> {
        let object = self.object_mut(node)?;
        if let Some(existing) = object.shape {
            return Err(Error::handle(format!(
                "object '{}' already has a {:?} shape",
                object.name, existing
            )));
        }
        object.shape = Some(kind);
        Ok(())
    }

    fn push_sample(&mut self, node: NodeHandle, kind: ShapeKind, value: SampleValue) -> Result<()> {
        if let Some(limit) = self.failures.writes_before_failure {
            if self.writes >= limit {
                let message = format!("injected write failure on object {}", node.index);
                return Err(Error::capture(message));
            }
        }
        let time = self.live_archive(node.context)?.time;
        let object = self.object_mut(node)?;
        if object.shape != Some(kind) {
            return Err(Error::handle(format!(
                "object '{}' has no {:?} shape",
                object.name, kind
            )));
        }
        object.samples.push(SampleRecord { time, value });
        self.writes += 1;
        Ok(())
    }
}

impl ArchiveBackend for MemoryArchive {
    fn create_context(&mut self, config: &ArchiveConfig) -> Option<ContextHandle> {
        let handle = if self.failures.refuse_context {
            None
        } else {
            self.archives.push(ArchiveRecord {
                config: config.clone(),
                path: None,
                live: true,
                time: 0.0,
                objects: Vec::new(),
            });
            Some(ContextHandle((self.archives.len() - 1) as u32))
        };
        self.calls.push(ArchiveCall::CreateContext(handle));
        handle
    }

    fn destroy_context(&mut self, context: ContextHandle) {
        self.calls.push(ArchiveCall::DestroyContext(context));
        if let Some(record) = self.archives.get_mut(context.0 as usize) {
            record.live = false;
        }
    }

    fn open_archive(&mut self, context: ContextHandle, path: &Path) -> bool {
        let rejected = path.as_os_str().is_empty()
            || self.failures.reject_paths.iter().any(|p| p == path);
        let ok = !rejected
            && match self.live_archive(context) {
                Ok(record) if record.path.is_none() => {
                    record.path = Some(path.to_path_buf());
                    record.objects.push(ObjectRecord::new("", None));
                    true
                }
                _ => false,
            };
        self.calls.push(ArchiveCall::OpenArchive {
            context,
            path: path.to_path_buf(),
            ok,
        });
        ok
    }

    fn root_object(&mut self, context: ContextHandle) -> Result<NodeHandle> {
        self.calls.push(ArchiveCall::RootObject(context));
        let record = self.live_archive(context)?;
        if record.objects.is_empty() {
            return Err(Error::handle(format!("context {} has no open archive", context.0)));
        }
        Ok(NodeHandle { context, index: 0 })
    }

    fn create_object(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle> {
        self.calls.push(ArchiveCall::CreateObject {
            parent,
            name: name.to_string(),
        });
        if let Some(limit) = self.failures.objects_before_failure {
            if self.objects_created >= limit {
                return Err(Error::handle(format!("injected failure creating '{}'", name)));
            }
        }
        let record = self.live_archive(parent.context)?;
        let parent_index = parent.index as usize;
        if parent_index >= record.objects.len() {
            return Err(Error::handle(format!("unknown parent object {}", parent.index)));
        }
        if record.objects[parent_index]
            .children
            .iter()
            .any(|&c| record.objects[c as usize].name == name)
        {
            return Err(Error::handle(format!("duplicate child name '{}'", name)));
        }
        let index = record.objects.len() as u32;
        record.objects.push(ObjectRecord::new(name, Some(parent.index)));
        record.objects[parent_index].children.push(index);
        self.objects_created += 1;
        Ok(NodeHandle {
            context: parent.context,
            index,
        })
    }

    fn add_xform(&mut self, node: NodeHandle) -> Result<XformHandle> {
        self.calls.push(ArchiveCall::AddXform(node));
        self.add_shape(node, ShapeKind::Xform)?;
        Ok(XformHandle(node))
    }

    fn write_xform_sample(&mut self, xform: XformHandle, sample: &XformSampleData) -> Result<()> {
        self.calls.push(ArchiveCall::WriteXform(xform));
        self.push_sample(xform.0, ShapeKind::Xform, SampleValue::Xform(*sample))
    }

    fn add_camera(&mut self, node: NodeHandle) -> Result<CameraHandle> {
        self.calls.push(ArchiveCall::AddCamera(node));
        self.add_shape(node, ShapeKind::Camera)?;
        Ok(CameraHandle(node))
    }

    fn write_camera_sample(
        &mut self,
        camera: CameraHandle,
        sample: &CameraSampleData,
    ) -> Result<()> {
        self.calls.push(ArchiveCall::WriteCamera(camera));
        self.push_sample(camera.0, ShapeKind::Camera, SampleValue::Camera(*sample))
    }

    fn add_polymesh(&mut self, node: NodeHandle) -> Result<MeshHandle> {
        self.calls.push(ArchiveCall::AddPolyMesh(node));
        self.add_shape(node, ShapeKind::PolyMesh)?;
        Ok(MeshHandle(node))
    }

    fn write_polymesh_sample(
        &mut self,
        mesh: MeshHandle,
        sample: &PolyMeshSampleData<'_>,
    ) -> Result<()> {
        self.calls.push(ArchiveCall::WritePolyMesh(mesh));
        let positions = bytemuck::cast_slice::<f32, Vec3>(sample.positions_flat()).to_vec();
        let value = SampleValue::PolyMesh {
            positions,
            indices: sample.indices().to_vec(),
        };
        self.push_sample(mesh.0, ShapeKind::PolyMesh, value)
    }

    fn set_time(&mut self, context: ContextHandle, time: f64) -> Result<()> {
        self.calls.push(ArchiveCall::SetTime { context, time });
        self.live_archive(context)?.time = time;
        Ok(())
    }
}
