//! Geometry, material and node constructors.

use rhai::{Array, Dynamic, Engine, ImmutableString, Map};

use crate::assets::{GeometryHandle, MaterialHandle};
use crate::resources::primitives::{
    CylinderOptions, PlaneOptions, SphereOptions, TorusOptions, create_box, create_cone,
    create_cylinder, create_plane, create_sphere, create_torus,
};
use crate::resources::{BoundingBox, Geometry, Material, color_from_hex, parse_color};
use crate::scene::{BindMode, Node, NodeHandle, SkeletonKey, Skeleton, SkinBinding};
use crate::script::context::{SharedContext, Three};
use crate::script::math_api::{QuatValue, Vector3Value};
use crate::script::{ScriptResult, to_f32, to_segments};

#[derive(Debug, Clone, Copy)]
pub struct GeometryRef(pub GeometryHandle);

#[derive(Debug, Clone, Copy)]
pub struct MaterialRef(pub MaterialHandle);

/// A node living in the build context's staging scene.
#[derive(Clone)]
pub struct NodeRef {
    pub(crate) ctx: SharedContext,
    pub(crate) handle: NodeHandle,
}

#[derive(Clone)]
pub struct SkeletonRef {
    pub(crate) ctx: SharedContext,
    pub(crate) key: SkeletonKey,
}

impl NodeRef {
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    fn read<R: Default>(&self, f: impl FnOnce(&Node) -> R) -> R {
        self.ctx.borrow().scene.get_node(self.handle).map(f).unwrap_or_default()
    }

    fn write(&self, f: impl FnOnce(&mut Node)) {
        if let Some(node) = self.ctx.borrow_mut().scene.get_node_mut(self.handle) {
            f(node);
        }
    }

    /// World-space bounds of this node's subtree, as `Box3.set_from_object`.
    pub(crate) fn world_bounding_box(&self) -> Option<BoundingBox> {
        let mut ctx = self.ctx.borrow_mut();
        ctx.scene.update_matrix_world();
        ctx.scene.bounding_box_of(self.handle, &ctx.assets)
    }

    fn add_child(&mut self, child: &NodeRef) -> ScriptResult<()> {
        let attached = self.ctx.borrow_mut().scene.attach(child.handle, self.handle);
        if attached {
            Ok(())
        } else {
            Err("object can't be added as a child of itself or its descendants".into())
        }
    }

    fn bind(&mut self, skeleton: &SkeletonRef) -> ScriptResult<()> {
        let mut ctx = self.ctx.borrow_mut();
        let scene = &mut ctx.scene;
        if scene.get_node(self.handle).is_none_or(|n| n.mesh.is_none()) {
            return Err("bind() requires a SkinnedMesh".into());
        }

        scene.update_matrix_world();
        let nodes = &scene.nodes;
        let skeletons = &mut scene.skeletons;
        let Some(target) = skeletons.get_mut(skeleton.key) else {
            return Err("unknown skeleton".into());
        };
        target.calculate_inverses(nodes);

        let Some(bind_matrix_inv) = nodes
            .get(self.handle)
            .map(|n| n.transform.world_matrix.inverse())
        else {
            return Err("bind() called on a removed node".into());
        };
        if let Some(node) = scene.get_node_mut(self.handle) {
            node.skin = Some(SkinBinding {
                skeleton: skeleton.key,
                bind_mode: BindMode::Attached,
                bind_matrix_inv,
            });
        }
        Ok(())
    }
}

fn add_geometry(three: &Three, geometry: Geometry) -> GeometryRef {
    let mut ctx = three.ctx.borrow_mut();
    let handle = ctx.assets.add_geometry(geometry);
    ctx.geometries.push(handle);
    GeometryRef(handle)
}

fn add_node(three: &Three, node: Node) -> NodeRef {
    let handle = three.ctx.borrow_mut().scene.add_node(node);
    NodeRef {
        ctx: three.ctx.clone(),
        handle,
    }
}

fn dimension(value: &Dynamic, what: &str) -> ScriptResult<f32> {
    let v = to_f32(value, what)?;
    if v < 0.0 {
        return Err(format!("{what} must not be negative").into());
    }
    Ok(v)
}

fn parse_color_value(value: &Dynamic) -> ScriptResult<glam::Vec3> {
    if let Ok(hex) = value.as_int() {
        return u32::try_from(hex)
            .map(color_from_hex)
            .map_err(|_| format!("invalid color {hex}").into());
    }
    if value.is_string() {
        let text = value.clone().into_immutable_string()?;
        return parse_color(text.as_str()).ok_or_else(|| format!("invalid color `{text}`").into());
    }
    Err(format!("color must be a string or integer, got {}", value.type_name()).into())
}

fn standard_material(params: &Map) -> ScriptResult<Material> {
    let mut material = Material::default();
    for (key, value) in params {
        match key.as_str() {
            "color" => material.color = parse_color_value(value)?,
            "emissive" => material.emissive = parse_color_value(value)?,
            "roughness" => material.roughness = to_f32(value, "roughness")?.clamp(0.0, 1.0),
            "metalness" => material.metalness = to_f32(value, "metalness")?.clamp(0.0, 1.0),
            "opacity" => material.opacity = to_f32(value, "opacity")?.clamp(0.0, 1.0),
            "transparent" => material.transparent = value.as_bool().unwrap_or(false),
            "wireframe" => material.wireframe = value.as_bool().unwrap_or(false),
            "name" => material.name = value.to_string(),
            other => log::debug!("Ignoring unsupported material parameter `{other}`"),
        }
    }
    Ok(material)
}

fn add_material(three: &Three, material: Material) -> MaterialRef {
    let mut ctx = three.ctx.borrow_mut();
    let handle = ctx.assets.add_material(material);
    ctx.materials.push(handle);
    MaterialRef(handle)
}

pub(crate) fn register(engine: &mut Engine, max_segments: u32) {
    engine
        .register_type_with_name::<Three>("THREE")
        .register_type_with_name::<GeometryRef>("BufferGeometry")
        .register_type_with_name::<MaterialRef>("MeshStandardMaterial")
        .register_type_with_name::<NodeRef>("Object3D")
        .register_type_with_name::<SkeletonRef>("Skeleton");

    register_geometries(engine, max_segments);
    register_nodes(engine);
}

// ============================================================================
// Geometries & materials
// ============================================================================

fn register_geometries(engine: &mut Engine, max_segments: u32) {
    engine
        .register_fn("BoxGeometry", |three: Three| add_geometry(&three, create_box(1.0, 1.0, 1.0)))
        .register_fn(
            "BoxGeometry",
            |three: Three, w: Dynamic, h: Dynamic, d: Dynamic| -> ScriptResult<GeometryRef> {
                let geometry = create_box(
                    dimension(&w, "width")?,
                    dimension(&h, "height")?,
                    dimension(&d, "depth")?,
                );
                Ok(add_geometry(&three, geometry))
            },
        )
        .register_fn("SphereGeometry", |three: Three, r: Dynamic| -> ScriptResult<GeometryRef> {
            let options = SphereOptions {
                radius: dimension(&r, "radius")?,
                ..Default::default()
            };
            Ok(add_geometry(&three, create_sphere(options)))
        })
        .register_fn(
            "SphereGeometry",
            move |three: Three, r: Dynamic, ws: Dynamic, hs: Dynamic| -> ScriptResult<GeometryRef> {
                let options = SphereOptions {
                    radius: dimension(&r, "radius")?,
                    width_segments: to_segments(&ws, "widthSegments", 3, max_segments)?,
                    height_segments: to_segments(&hs, "heightSegments", 2, max_segments)?,
                };
                Ok(add_geometry(&three, create_sphere(options)))
            },
        )
        .register_fn(
            "CylinderGeometry",
            |three: Three, rt: Dynamic, rb: Dynamic, h: Dynamic| -> ScriptResult<GeometryRef> {
                let options = CylinderOptions {
                    radius_top: dimension(&rt, "radiusTop")?,
                    radius_bottom: dimension(&rb, "radiusBottom")?,
                    height: dimension(&h, "height")?,
                    ..Default::default()
                };
                Ok(add_geometry(&three, create_cylinder(options)))
            },
        )
        .register_fn(
            "CylinderGeometry",
            move |three: Three, rt: Dynamic, rb: Dynamic, h: Dynamic, segs: Dynamic| -> ScriptResult<GeometryRef> {
                let options = CylinderOptions {
                    radius_top: dimension(&rt, "radiusTop")?,
                    radius_bottom: dimension(&rb, "radiusBottom")?,
                    height: dimension(&h, "height")?,
                    radial_segments: to_segments(&segs, "radialSegments", 3, max_segments)?,
                    ..Default::default()
                };
                Ok(add_geometry(&three, create_cylinder(options)))
            },
        )
        .register_fn("ConeGeometry", |three: Three, r: Dynamic, h: Dynamic| -> ScriptResult<GeometryRef> {
            let geometry = create_cone(dimension(&r, "radius")?, dimension(&h, "height")?, 32);
            Ok(add_geometry(&three, geometry))
        })
        .register_fn(
            "ConeGeometry",
            move |three: Three, r: Dynamic, h: Dynamic, segs: Dynamic| -> ScriptResult<GeometryRef> {
                let geometry = create_cone(
                    dimension(&r, "radius")?,
                    dimension(&h, "height")?,
                    to_segments(&segs, "radialSegments", 3, max_segments)?,
                );
                Ok(add_geometry(&three, geometry))
            },
        )
        .register_fn("PlaneGeometry", |three: Three, w: Dynamic, h: Dynamic| -> ScriptResult<GeometryRef> {
            let options = PlaneOptions {
                width: dimension(&w, "width")?,
                height: dimension(&h, "height")?,
                ..Default::default()
            };
            Ok(add_geometry(&three, create_plane(options)))
        })
        .register_fn("TorusGeometry", |three: Three, r: Dynamic, tube: Dynamic| -> ScriptResult<GeometryRef> {
            let options = TorusOptions {
                radius: dimension(&r, "radius")?,
                tube: dimension(&tube, "tube")?,
                ..Default::default()
            };
            Ok(add_geometry(&three, create_torus(options)))
        })
        .register_fn(
            "TorusGeometry",
            move |three: Three, r: Dynamic, tube: Dynamic, rs: Dynamic, ts: Dynamic| -> ScriptResult<GeometryRef> {
                let options = TorusOptions {
                    radius: dimension(&r, "radius")?,
                    tube: dimension(&tube, "tube")?,
                    radial_segments: to_segments(&rs, "radialSegments", 2, max_segments)?,
                    tubular_segments: to_segments(&ts, "tubularSegments", 3, max_segments)?,
                };
                Ok(add_geometry(&three, create_torus(options)))
            },
        )
        .register_fn("MeshStandardMaterial", |three: Three| add_material(&three, Material::default()))
        .register_fn(
            "MeshStandardMaterial",
            |three: Three, params: Map| -> ScriptResult<MaterialRef> {
                Ok(add_material(&three, standard_material(&params)?))
            },
        );
}

// ============================================================================
// Nodes
// ============================================================================

fn node_arg(value: &Dynamic, what: &str) -> ScriptResult<NodeRef> {
    value
        .clone()
        .try_cast::<NodeRef>()
        .ok_or_else(|| format!("{what} must be an Object3D, got {}", value.type_name()).into())
}

fn register_nodes(engine: &mut Engine) {
    engine
        .register_fn("Group", |three: Three| add_node(&three, Node::new("")))
        .register_fn("Object3D", |three: Three| add_node(&three, Node::new("")))
        .register_fn("Bone", |three: Three| add_node(&three, Node::new_bone()))
        .register_fn("Mesh", |three: Three, geometry: GeometryRef, material: MaterialRef| {
            add_node(&three, Node::new_mesh(geometry.0, material.0))
        })
        .register_fn("SkinnedMesh", |three: Three, geometry: GeometryRef, material: MaterialRef| {
            add_node(&three, Node::new_mesh(geometry.0, material.0))
        })
        .register_fn("Skeleton", |three: Three, bones: Array| -> ScriptResult<SkeletonRef> {
            let handles = bones
                .iter()
                .map(|b| node_arg(b, "skeleton bone").map(|n| n.handle))
                .collect::<ScriptResult<Vec<_>>>()?;
            let key = three.ctx.borrow_mut().scene.add_skeleton(Skeleton::new("", handles));
            Ok(SkeletonRef {
                ctx: three.ctx.clone(),
                key,
            })
        })
        .register_get("bones", |s: &mut SkeletonRef| -> Array {
            let bones = s
                .ctx
                .borrow()
                .scene
                .skeletons
                .get(s.key)
                .map(|sk| sk.bones.clone())
                .unwrap_or_default();
            bones
                .into_iter()
                .map(|handle| {
                    Dynamic::from(NodeRef {
                        ctx: s.ctx.clone(),
                        handle,
                    })
                })
                .collect()
        })
        .register_fn("add", |this: &mut NodeRef, child: NodeRef| this.add_child(&child))
        .register_fn("add", |this: &mut NodeRef, a: NodeRef, b: NodeRef| -> ScriptResult<()> {
            this.add_child(&a)?;
            this.add_child(&b)
        })
        .register_fn(
            "add",
            |this: &mut NodeRef, a: NodeRef, b: NodeRef, c: NodeRef| -> ScriptResult<()> {
                this.add_child(&a)?;
                this.add_child(&b)?;
                this.add_child(&c)
            },
        )
        .register_fn("bind", |this: &mut NodeRef, skeleton: SkeletonRef| this.bind(&skeleton))
        .register_fn(
            "set_position",
            |this: &mut NodeRef, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<()> {
                let v = glam::Vec3::new(to_f32(&x, "x")?, to_f32(&y, "y")?, to_f32(&z, "z")?);
                this.write(|n| n.transform.position = v);
                Ok(())
            },
        )
        .register_fn(
            "set_rotation",
            |this: &mut NodeRef, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<()> {
                let (x, y, z) = (to_f32(&x, "x")?, to_f32(&y, "y")?, to_f32(&z, "z")?);
                this.write(|n| n.transform.set_rotation_euler(x, y, z));
                Ok(())
            },
        )
        .register_fn(
            "set_scale",
            |this: &mut NodeRef, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<()> {
                let v = glam::Vec3::new(to_f32(&x, "x")?, to_f32(&y, "y")?, to_f32(&z, "z")?);
                this.write(|n| n.transform.scale = v);
                Ok(())
            },
        )
        .register_fn("set_scale", |this: &mut NodeRef, s: Dynamic| -> ScriptResult<()> {
            let s = to_f32(&s, "scale")?;
            this.write(|n| n.transform.scale = glam::Vec3::splat(s));
            Ok(())
        })
        .register_get("name", |this: &mut NodeRef| this.read(|n| n.name.clone()))
        .register_set("name", |this: &mut NodeRef, name: ImmutableString| {
            this.write(|n| n.name = name.to_string());
        })
        .register_get_set(
            "visible",
            |this: &mut NodeRef| this.read(|n| n.visible),
            |this: &mut NodeRef, visible: bool| this.write(|n| n.visible = visible),
        )
        .register_get_set(
            "position",
            |this: &mut NodeRef| this.read(|n| Vector3Value(n.transform.position)),
            |this: &mut NodeRef, v: Vector3Value| this.write(|n| n.transform.position = v.0),
        )
        .register_get_set(
            "rotation",
            |this: &mut NodeRef| this.read(|n| Vector3Value(n.transform.rotation_euler())),
            |this: &mut NodeRef, v: Vector3Value| {
                this.write(|n| n.transform.set_rotation_euler(v.0.x, v.0.y, v.0.z));
            },
        )
        .register_get_set(
            "quaternion",
            |this: &mut NodeRef| this.read(|n| QuatValue(n.transform.rotation)),
            |this: &mut NodeRef, q: QuatValue| this.write(|n| n.transform.rotation = q.0),
        )
        .register_get_set(
            "scale",
            |this: &mut NodeRef| this.read(|n| Vector3Value(n.transform.scale)),
            |this: &mut NodeRef, v: Vector3Value| this.write(|n| n.transform.scale = v.0),
        )
        .register_get("is_bone", |this: &mut NodeRef| this.read(|n| n.is_bone))
        .register_get("type", |this: &mut NodeRef| this.read(|n| n.kind().to_string()))
        .register_get("children", |this: &mut NodeRef| -> Array {
            let children = this.read(|n| n.children().to_vec());
            children
                .into_iter()
                .map(|handle| {
                    Dynamic::from(NodeRef {
                        ctx: this.ctx.clone(),
                        handle,
                    })
                })
                .collect()
        });
}
