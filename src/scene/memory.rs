//! Minimal in-process host scene.
//!
//! Objects are owned by the scene through `Rc`. [`MemoryScene::destroy`]
//! drops the scene's reference, which is what a recording session observes
//! as a destroyed object.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{
    CameraState, CameraTarget, CustomRecorder, CustomRecorderRef, Mesh, MeshRendererTarget, Scene,
    SceneNode, SkinnedMeshTarget,
};
use crate::util::WorldTransform;

/// Named object with a mutable world transform.
#[derive(Debug)]
pub struct SceneObject {
    name: String,
    transform: Cell<WorldTransform>,
}

impl SceneObject {
    fn new(name: &str, transform: WorldTransform) -> Self {
        Self { name: name.to_string(), transform: Cell::new(transform) }
    }
}

/// Camera object.
#[derive(Debug)]
pub struct SceneCamera {
    object: SceneObject,
    state: Cell<CameraState>,
}

impl SceneCamera {
    pub fn set_state(&self, state: CameraState) {
        self.state.set(state);
    }
}

/// Object drawn with a static mesh.
#[derive(Debug)]
pub struct SceneMeshRenderer {
    object: SceneObject,
    mesh: RefCell<Option<Rc<Mesh>>>,
}

/// Object drawn with a deformed mesh, refreshed by the host every frame.
#[derive(Debug)]
pub struct SceneSkinnedMeshRenderer {
    object: SceneObject,
    mesh: RefCell<Option<Rc<Mesh>>>,
}

macro_rules! impl_scene_node {
    ($($ty:ty),*) => {
        $(
            impl SceneNode for $ty {
                fn name(&self) -> String {
                    self.object.name.clone()
                }

                fn world_transform(&self) -> WorldTransform {
                    self.object.transform.get()
                }
            }
        )*
    };
}

impl_scene_node!(SceneCamera, SceneMeshRenderer, SceneSkinnedMeshRenderer);

impl CameraTarget for SceneCamera {
    fn camera_state(&self) -> CameraState {
        self.state.get()
    }
}

impl MeshRendererTarget for SceneMeshRenderer {
    fn shared_mesh(&self) -> Option<Rc<Mesh>> {
        self.mesh.borrow().clone()
    }
}

impl SkinnedMeshTarget for SceneSkinnedMeshRenderer {
    fn evaluated_mesh(&self) -> Option<Rc<Mesh>> {
        self.mesh.borrow().clone()
    }
}

/// Scene holding objects of every capturable kind, in insertion order.
#[derive(Default)]
pub struct MemoryScene {
    cameras: Vec<Rc<SceneCamera>>,
    mesh_renderers: Vec<Rc<SceneMeshRenderer>>,
    skinned: Vec<Rc<SceneSkinnedMeshRenderer>>,
    custom: Vec<(String, CustomRecorderRef)>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_camera(&mut self, name: &str, transform: WorldTransform, state: CameraState) {
        self.cameras.push(Rc::new(SceneCamera {
            object: SceneObject::new(name, transform),
            state: Cell::new(state),
        }));
    }

    pub fn add_mesh_renderer(&mut self, name: &str, transform: WorldTransform, mesh: Option<Mesh>) {
        self.mesh_renderers.push(Rc::new(SceneMeshRenderer {
            object: SceneObject::new(name, transform),
            mesh: RefCell::new(mesh.map(Rc::new)),
        }));
    }

    pub fn add_skinned_mesh_renderer(
        &mut self,
        name: &str,
        transform: WorldTransform,
        mesh: Option<Mesh>,
    ) {
        self.skinned.push(Rc::new(SceneSkinnedMeshRenderer {
            object: SceneObject::new(name, transform),
            mesh: RefCell::new(mesh.map(Rc::new)),
        }));
    }

    /// Add a custom recorder. The returned handle lets the caller inspect
    /// it; holding it also keeps the recorder alive past [`Self::destroy`].
    pub fn add_custom_recorder<R>(&mut self, recorder: R) -> Rc<RefCell<R>>
    where
        R: CustomRecorder + 'static,
    {
        let name = recorder.name();
        let shared = Rc::new(RefCell::new(recorder));
        let erased: CustomRecorderRef = shared.clone();
        self.custom.push((name, erased));
        shared
    }

    pub fn camera(&self, name: &str) -> Option<Rc<SceneCamera>> {
        self.cameras.iter().find(|c| c.object.name == name).cloned()
    }

    /// Move every object called `name`. Returns how many were moved.
    pub fn set_transform(&self, name: &str, transform: WorldTransform) -> usize {
        let mut count = 0;
        for object in self.objects().filter(|o| o.name == name) {
            object.transform.set(transform);
            count += 1;
        }
        count
    }

    /// Replace the mesh of every renderer (static or skinned) called `name`.
    pub fn set_mesh(&self, name: &str, mesh: Option<Mesh>) -> usize {
        let mesh = mesh.map(Rc::new);
        let mut count = 0;
        for renderer in self.mesh_renderers.iter().filter(|r| r.object.name == name) {
            *renderer.mesh.borrow_mut() = mesh.clone();
            count += 1;
        }
        for renderer in self.skinned.iter().filter(|r| r.object.name == name) {
            *renderer.mesh.borrow_mut() = mesh.clone();
            count += 1;
        }
        count
    }

    /// Remove every object called `name` from the scene.
    pub fn destroy(&mut self, name: &str) -> usize {
        let before = self.len();
        self.cameras.retain(|c| c.object.name != name);
        self.mesh_renderers.retain(|r| r.object.name != name);
        self.skinned.retain(|r| r.object.name != name);
        self.custom.retain(|(n, _)| n != name);
        before - self.len()
    }

    /// Objects of all kinds.
    pub fn len(&self) -> usize {
        self.cameras.len() + self.mesh_renderers.len() + self.skinned.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.cameras
            .iter()
            .map(|c| &c.object)
            .chain(self.mesh_renderers.iter().map(|r| &r.object))
            .chain(self.skinned.iter().map(|r| &r.object))
    }
}

impl Scene for MemoryScene {
    fn cameras(&self) -> Vec<Rc<dyn CameraTarget>> {
        self.cameras.iter().map(|c| c.clone() as Rc<dyn CameraTarget>).collect()
    }

    fn mesh_renderers(&self) -> Vec<Rc<dyn MeshRendererTarget>> {
        self.mesh_renderers
            .iter()
            .map(|r| r.clone() as Rc<dyn MeshRendererTarget>)
            .collect()
    }

    fn skinned_mesh_renderers(&self) -> Vec<Rc<dyn SkinnedMeshTarget>> {
        self.skinned
            .iter()
            .map(|r| r.clone() as Rc<dyn SkinnedMeshTarget>)
            .collect()
    }

    fn custom_recorders(&self) -> Vec<CustomRecorderRef> {
        self.custom.iter().map(|(_, r)| r.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;
    use std::rc::Weak;

    #[test]
    fn test_enumeration_and_destroy() {
        let mut scene = MemoryScene::new();
        scene.add_camera("main", WorldTransform::IDENTITY, CameraState::default());
        scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));
        scene.add_skinned_mesh_renderer("body", WorldTransform::IDENTITY, None);
        assert_eq!(scene.len(), 3);

        let weak: Weak<dyn MeshRendererTarget> = Rc::downgrade(&scene.mesh_renderers()[0]);
        assert!(weak.upgrade().is_some());

        assert_eq!(scene.destroy("cube"), 1);
        assert!(weak.upgrade().is_none());
        assert!(scene.mesh_renderers().is_empty());
        assert_eq!(scene.cameras().len(), 1);
    }

    #[test]
    fn test_mutation_is_visible_through_trait_objects() {
        let mut scene = MemoryScene::new();
        scene.add_skinned_mesh_renderer("body", WorldTransform::IDENTITY, None);
        let body = scene.skinned_mesh_renderers().remove(0);
        assert!(body.evaluated_mesh().is_none());

        let moved = WorldTransform::from_trs(Vec3::Y, Default::default(), Vec3::ONE);
        assert_eq!(scene.set_transform("body", moved), 1);
        assert_eq!(scene.set_mesh("body", Some(Mesh::cube())), 1);
        assert_eq!(body.world_transform(), moved);
        assert_eq!(body.evaluated_mesh().unwrap().vertices().len(), 8);
    }
}
