use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

use image::GenericImageView;
use scene_import::{GpuContext, ModelVertex, ShaderHandle, TextureRole, TextureSlot, WrapMode};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Everything a [`RecordingContext`] was asked to do.
#[derive(Debug, Default)]
pub struct GpuLog {
    next_id: u32,
    pub texture_uploads: Vec<(u32, String, TextureRole)>,
    pub texture_releases: Vec<u32>,
    pub buffers_created: usize,
    pub buffers_released: usize,
}

#[derive(Debug)]
struct Release {
    id: u32,
    log: Rc<RefCell<GpuLog>>,
}

impl Drop for Release {
    fn drop(&mut self) {
        self.log.borrow_mut().texture_releases.push(self.id);
    }
}

/// Texture handle whose GPU texture counts as released once the last clone is dropped.
#[derive(Clone, Debug)]
pub struct RecordedTexture {
    pub id: u32,
    pub size: (u32, u32),
    pub wrap: WrapMode,
    _release: Rc<Release>,
}

#[derive(Debug)]
pub struct RecordedBuffer {
    pub id: u32,
    pub len: usize,
    log: Rc<RefCell<GpuLog>>,
}

impl Drop for RecordedBuffer {
    fn drop(&mut self) {
        self.log.borrow_mut().buffers_released += 1;
    }
}

/// A GPU context that creates no GPU resources and records every request instead.
#[derive(Debug)]
pub struct RecordingContext {
    log: Rc<RefCell<GpuLog>>,
    max_texture_size: u32,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            log: Rc::default(),
            max_texture_size: u32::MAX,
        }
    }

    /// Uploads of larger images fail, like a device limit would.
    pub fn with_max_texture_size(max_texture_size: u32) -> Self {
        Self {
            max_texture_size,
            ..Self::new()
        }
    }

    pub fn log(&self) -> std::cell::Ref<'_, GpuLog> {
        self.log.borrow()
    }

    fn next_id(&self) -> u32 {
        let mut log = self.log.borrow_mut();
        log.next_id += 1;
        log.next_id
    }

    fn buffer(&self, len: usize) -> RecordedBuffer {
        let id = self.next_id();
        self.log.borrow_mut().buffers_created += 1;
        RecordedBuffer {
            id,
            len,
            log: self.log.clone(),
        }
    }
}

impl GpuContext for RecordingContext {
    type Buffer = RecordedBuffer;
    type Texture = RecordedTexture;

    fn create_vertex_buffer(&self, _: &str, vertices: &[ModelVertex]) -> RecordedBuffer {
        self.buffer(vertices.len())
    }

    fn create_index_buffer(&self, _: &str, indices: &[u32]) -> RecordedBuffer {
        self.buffer(indices.len())
    }

    fn create_texture(
        &self,
        label: &str,
        image: &image::DynamicImage,
        role: TextureRole,
        wrap: WrapMode,
    ) -> anyhow::Result<RecordedTexture> {
        let size = image.dimensions();
        anyhow::ensure!(
            size.0 <= self.max_texture_size && size.1 <= self.max_texture_size,
            "{}x{} exceeds the texture size limit",
            size.0,
            size.1
        );
        let id = self.next_id();
        self.log
            .borrow_mut()
            .texture_uploads
            .push((id, label.to_string(), role));
        Ok(RecordedTexture {
            id,
            size,
            wrap,
            _release: Rc::new(Release {
                id,
                log: self.log.clone(),
            }),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Bind { slot: TextureSlot, texture: u32 },
    Draw { vertex_buffer: u32, index_buffer: u32, index_count: u32 },
    /// A draw that asked for no material.
    DrawGeometry { index_count: u32 },
}

/// Shader handle that records bind and draw calls in order.
#[derive(Debug, Default)]
pub struct RecordingShader {
    pub calls: Vec<Call>,
}

impl RecordingShader {
    pub fn draws(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Draw { .. }))
            .collect()
    }
}

impl ShaderHandle<RecordingContext> for RecordingShader {
    fn bind_texture(&mut self, slot: TextureSlot, texture: &RecordedTexture) {
        self.calls.push(Call::Bind {
            slot,
            texture: texture.id,
        });
    }

    fn draw_indexed(&mut self, vertex_buffer: &RecordedBuffer, index_buffer: &RecordedBuffer, index_count: u32) {
        self.calls.push(Call::Draw {
            vertex_buffer: vertex_buffer.id,
            index_buffer: index_buffer.id,
            index_count,
        });
    }

    fn draw_geometry(&mut self, _: &RecordedBuffer, _: &RecordedBuffer, index_count: u32) {
        self.calls.push(Call::DrawGeometry { index_count });
    }
}

/// A scratch directory for asset files, removed on drop.
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(name: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let root = std::env::temp_dir().join(format!(
            "scene-import-{name}-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).expect("create asset dir");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write asset file");
        path
    }

    pub fn write_png(&self, relative: &str, size: u32, rgba: [u8; 4]) -> PathBuf {
        self.write(relative, png_bytes(size, rgba))
    }
}

impl Drop for AssetDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

pub fn png_bytes(size: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Two objects, `A` and `B`, with one triangle each. `A` uses `m1` (diffuse
/// `a.png`), `B` uses `m2` (diffuse `a.png`, specular `b.png`).
pub const TWO_NODE_OBJ: &str = "\
mtllib scene.mtl
o A
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
usemtl m1
f 1/1/1 2/2/1 3/3/1
o B
v 0 0 1
v 1 0 1
v 0 1 1
v 1 1 1
vt 0 0
vt 1 0
vt 0 1
vt 1 1
vn 0 0 1
usemtl m2
f 4/4/2 5/5/2 7/7/2 6/6/2
";

pub const TWO_NODE_MTL: &str = "\
newmtl m1
map_Kd a.png

newmtl m2
map_Kd a.png
map_Ks b.png
";

pub fn two_node_asset(dir: &AssetDir) -> PathBuf {
    dir.write("scene.mtl", TWO_NODE_MTL);
    dir.write_png("a.png", 2, [255, 0, 0, 255]);
    dir.write_png("b.png", 2, [0, 255, 0, 255]);
    dir.write("scene.obj", TWO_NODE_OBJ)
}
