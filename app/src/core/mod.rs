use mapserver::{Bitmap, Extent, MapUrl, ZoomDirection};
use nalgebra::{vector, Vector2};

use crate::types::Transform;

pub const DEFAULT_ZOOM_STEP: f64 = 0.1;

/// Rendering surface hosting the map image.
pub trait Surface {
    /// Current allocation in pixels.
    fn pixel_size(&self) -> Vector2<i32>;

    fn set_transform(&self, transform: Transform);

    /// Replace the displayed image. `None` shows no image.
    fn set_image(&self, image: Option<Bitmap>);
}

/// Input handling of a map viewport.
pub trait ViewportEvents {
    fn on_resize(&self, width: i32, height: i32);
    fn on_pointer_down(&self, x: f64, y: f64);
    fn on_pointer_move(&self, x: f64, y: f64);
    fn on_pointer_up(&self, x: f64, y: f64);
    fn on_key_release(&self, command: Command);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ZoomIn,
    ZoomOut,
    Reset,
    /// Pan by a fraction of the viewport size.
    Pan(Vector2<f64>),
}

/// A request for a map image matching the controller state at the time it
/// was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub url: String,
    pub size: Vector2<u32>,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: Vector2<f64>,
    transform: Transform,
}

/// Tracks the map extent and the screen transform of the displayed image.
///
/// Every change to extent or size bumps the generation, so that results of
/// requests issued before the change can be recognized and dropped.
#[derive(Debug)]
pub struct MapController {
    url: Option<MapUrl>,
    home: Option<Extent>,
    extent: Option<Extent>,
    transform: Transform,
    drag: Option<Drag>,
    size: Vector2<i32>,
    zoom_step: f64,
    generation: u64,
}

impl Default for MapController {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_STEP)
    }
}

impl MapController {
    pub fn new(zoom_step: f64) -> Self {
        Self {
            url: None,
            home: None,
            extent: None,
            transform: Transform::identity(),
            drag: None,
            size: vector![0, 0],
            zoom_step,
            generation: 0,
        }
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    pub fn set_zoom_step(&mut self, step: f64) {
        self.zoom_step = step;
    }

    /// Whether a map image can be requested.
    pub fn is_drawable(&self) -> bool {
        self.url.is_some() && self.extent.is_some() && self.size.x > 0 && self.size.y > 0
    }

    /// Set the map URL and home extent.
    ///
    /// Without an explicit extent, the one given by the URL's `mapext`
    /// parameter is used. If there is neither, the URL is kept but the map
    /// stays undrawn and `Error::MissingExtent` is returned.
    pub fn set_home(&mut self, url: &str, extent: Option<Extent>) -> mapserver::Result<()> {
        let (url, url_extent) = MapUrl::parse(url)?;
        let extent = extent.or(url_extent);

        self.url = Some(url);
        self.home = extent;
        self.extent = extent;
        self.transform = Transform::identity();
        self.drag = None;
        self.generation += 1;

        match extent {
            Some(_) => Ok(()),
            None => Err(mapserver::Error::MissingExtent),
        }
    }

    /// Zoom in or out around the center of the current extent.
    ///
    /// The displayed image is scaled around the viewport center so that it
    /// previews the new extent until the next redraw. Returns `false` if
    /// there is no extent to zoom.
    pub fn zoom(&mut self, direction: ZoomDirection, surface: &impl Surface) -> bool {
        let Some(extent) = self.extent else {
            return false;
        };

        let zoomed = extent.zoom(direction, self.zoom_step);
        let ratio = extent.width() / zoomed.width();

        let center = vector![self.size.x as f64, self.size.y as f64] / 2.0;
        self.transform = self.transform.zoom_with_focus(center, ratio);
        surface.set_transform(self.transform);

        tracing::debug!(%zoomed, ?direction, "zoom");

        self.extent = Some(zoomed);
        self.generation += 1;
        true
    }

    /// Go back to the home extent.
    pub fn reset(&mut self, surface: &impl Surface) -> bool {
        let Some(home) = self.home else {
            return false;
        };

        self.extent = Some(home);
        self.transform = Transform::identity();
        self.drag = None;
        surface.set_transform(self.transform);

        self.generation += 1;
        true
    }

    /// Move the displayed image by a pixel delta. The extent is left as is.
    pub fn pan(&mut self, delta: Vector2<f64>, surface: &impl Surface) {
        self.transform = self.transform.translate(delta);
        surface.set_transform(self.transform);
    }

    /// Move the extent by the world distance corresponding to a pixel delta
    /// of a finished pan.
    ///
    /// The server renders with square cells, widening the extent along one
    /// axis if its aspect ratio differs from the image size. Both axes
    /// therefore use the larger of the two resolutions. Screen y grows
    /// downwards while world y grows upwards.
    pub fn commit_pan(&mut self, delta: Vector2<f64>) -> bool {
        let Some(extent) = self.extent else {
            return false;
        };

        if (delta.x == 0.0 && delta.y == 0.0) || self.size.x <= 0 || self.size.y <= 0 {
            return false;
        }

        let res_x = extent.width() / self.size.x as f64;
        let res_y = extent.height() / self.size.y as f64;
        let cell = res_x.max(res_y);

        self.extent = Some(extent.translate(-delta.x * cell, delta.y * cell));
        self.generation += 1;
        true
    }

    pub fn drag_begin(&mut self, pos: Vector2<f64>) {
        self.drag = Some(Drag {
            start: pos,
            transform: self.transform,
        });
    }

    pub fn drag_update(&mut self, pos: Vector2<f64>, surface: &impl Surface) {
        if let Some(drag) = self.drag {
            self.transform = drag.transform.translate(pos - drag.start);
            surface.set_transform(self.transform);
        }
    }

    /// Finish a drag. Returns whether the extent changed.
    pub fn drag_end(&mut self, pos: Vector2<f64>, surface: &impl Surface) -> bool {
        self.drag_update(pos, surface);

        match self.drag.take() {
            Some(drag) => self.commit_pan(pos - drag.start),
            None => false,
        }
    }

    /// Record a new viewport size. Returns whether it changed.
    pub fn resize(&mut self, width: i32, height: i32) -> bool {
        if self.size == vector![width, height] {
            return false;
        }

        self.size = vector![width, height];
        self.generation += 1;
        true
    }

    /// Build the request for the current state, if drawable.
    pub fn request(&self) -> Option<MapRequest> {
        if !self.is_drawable() {
            return None;
        }

        let url = self.url.as_ref()?;
        let extent = self.extent?;
        let size = vector![self.size.x as u32, self.size.y as u32];

        Some(MapRequest {
            url: url.map_url(size.x, size.y, &extent),
            size,
            generation: self.generation,
        })
    }

    /// Apply the result of a request.
    ///
    /// Results of outdated requests are dropped. A failed request is logged
    /// and leaves the surface without image. Returns whether the result was
    /// applied.
    pub fn finish(
        &mut self,
        generation: u64,
        result: mapserver::Result<Bitmap>,
        surface: &impl Surface,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping outdated map image");
            return false;
        }

        match result {
            Ok(image) => surface.set_image(Some(image)),
            Err(err) => {
                tracing::warn!("failed to load map image: {err}");
                surface.set_image(None);
            }
        }

        self.transform = Transform::identity();
        if let Some(drag) = self.drag.as_mut() {
            drag.transform = self.transform;
        }
        surface.set_transform(self.transform);

        true
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        transform: Cell<Option<Transform>>,
        image: RefCell<Option<Option<(u32, u32)>>>,
    }

    impl Surface for RecordingSurface {
        fn pixel_size(&self) -> Vector2<i32> {
            vector![200, 100]
        }

        fn set_transform(&self, transform: Transform) {
            self.transform.set(Some(transform));
        }

        fn set_image(&self, image: Option<Bitmap>) {
            *self.image.borrow_mut() = Some(image.map(|i| (i.width(), i.height())));
        }
    }

    fn controller() -> MapController {
        let mut ctrl = MapController::default();
        ctrl.set_home("http://host/map?layers=x&mapext=0 0 200 100", None)
            .unwrap();
        ctrl.resize(200, 100);
        ctrl
    }

    fn bitmap() -> Bitmap {
        Bitmap::from_rgba(2, 1, vec![0; 8]).unwrap()
    }

    #[test]
    fn set_home_from_url() {
        let ctrl = controller();

        assert_eq!(ctrl.home, Some(Extent::new(0.0, 0.0, 200.0, 100.0)));
        assert_eq!(ctrl.extent(), ctrl.home);
        assert_eq!(ctrl.url.as_ref().unwrap().stripped(), "http://host/map?layers=x");
        assert!(ctrl.is_drawable());
    }

    #[test]
    fn set_home_explicit_extent_wins() {
        let mut ctrl = MapController::default();
        let ext = Extent::new(1.0, 2.0, 3.0, 4.0);

        ctrl.set_home("http://host/map?mapext=0 0 9 9", Some(ext))
            .unwrap();
        assert_eq!(ctrl.home, Some(ext));
    }

    #[test]
    fn set_home_without_extent() {
        let mut ctrl = MapController::default();
        ctrl.resize(10, 10);

        let res = ctrl.set_home("http://host/map?layers=x", None);

        assert!(matches!(res, Err(mapserver::Error::MissingExtent)));
        assert!(!ctrl.is_drawable());
        assert_eq!(ctrl.request(), None);
    }

    #[test]
    fn request_url() {
        let ctrl = controller();
        let req = ctrl.request().unwrap();

        assert_eq!(
            req.url,
            "http://host/map?layers=x&mapsize=200 100&mapext=0 0 200 100"
        );
        assert_eq!(req.size, vector![200, 100]);
        assert_eq!(req.generation, ctrl.generation);
    }

    #[test]
    fn not_drawable_without_size() {
        let mut ctrl = MapController::default();
        ctrl.set_home("http://host/map?mapext=0 0 1 1", None).unwrap();

        assert!(!ctrl.is_drawable());
        assert!(ctrl.resize(0, 10));
        assert!(!ctrl.is_drawable());
    }

    #[test]
    fn zoom_updates_extent_and_preview() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();

        assert!(ctrl.zoom(ZoomDirection::In, &surface));
        assert_eq!(ctrl.extent(), Some(Extent::new(10.0, 5.0, 190.0, 95.0)));

        // image is scaled up around the viewport center, which stays fixed
        let t = surface.transform.get().unwrap();
        let center = vector![100.0, 50.0];
        assert!((t.scale - 200.0 / 180.0).abs() < 1e-12);
        assert!((t.offset + center * t.scale - center).norm() < 1e-9);
    }

    #[test]
    fn zoom_in_out_compounds() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();

        ctrl.zoom(ZoomDirection::In, &surface);
        ctrl.zoom(ZoomDirection::Out, &surface);

        let ext = ctrl.extent().unwrap();
        assert!((ext.width() - 200.0 * 0.9 * 1.1).abs() < 1e-9);
        assert!((ext.height() - 100.0 * 0.9 * 1.1).abs() < 1e-9);
        assert!((ext.center().0 - 100.0).abs() < 1e-9);
        assert!((ext.center().1 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_without_extent() {
        let mut ctrl = MapController::default();
        let surface = RecordingSurface::default();

        assert!(!ctrl.zoom(ZoomDirection::In, &surface));
        assert!(surface.transform.get().is_none());
    }

    #[test]
    fn reset_restores_home() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();

        ctrl.zoom(ZoomDirection::In, &surface);
        ctrl.zoom(ZoomDirection::In, &surface);
        ctrl.pan(vector![3.0, 4.0], &surface);

        assert!(ctrl.reset(&surface));
        assert_eq!(ctrl.extent(), ctrl.home);
        assert_eq!(surface.transform.get(), Some(Transform::identity()));
    }

    #[test]
    fn pan_is_visual_only() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();
        let generation = ctrl.generation;

        ctrl.pan(vector![5.0, -2.0], &surface);

        assert_eq!(ctrl.extent(), ctrl.home);
        assert_eq!(ctrl.generation, generation);
        assert_eq!(ctrl.transform.offset, vector![5.0, -2.0]);
    }

    #[test]
    fn drag_moves_extent() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();

        ctrl.drag_begin(vector![50.0, 50.0]);
        ctrl.drag_update(vector![60.0, 40.0], &surface);
        assert_eq!(surface.transform.get().unwrap().offset, vector![10.0, -10.0]);
        assert_eq!(ctrl.extent(), ctrl.home);

        assert!(ctrl.drag_end(vector![70.0, 30.0], &surface));
        assert!(ctrl.drag.is_none());

        // dragged 20px right and 20px up at one unit per pixel
        assert_eq!(ctrl.extent(), Some(Extent::new(-20.0, -20.0, 180.0, 80.0)));
    }

    #[test]
    fn drag_uses_square_cells() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();

        // the server widens the extent vertically to 200 units
        ctrl.resize(200, 200);

        ctrl.drag_begin(vector![100.0, 50.0]);
        assert!(ctrl.drag_end(vector![100.0, 150.0], &surface));

        assert_eq!(ctrl.extent(), Some(Extent::new(0.0, 100.0, 200.0, 200.0)));
    }

    #[test]
    fn click_without_motion_keeps_extent() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();
        let generation = ctrl.generation;

        ctrl.drag_begin(vector![5.0, 5.0]);
        assert!(!ctrl.drag_end(vector![5.0, 5.0], &surface));
        assert_eq!(ctrl.generation, generation);
    }

    #[test]
    fn resize_same_size() {
        let mut ctrl = controller();
        assert!(!ctrl.resize(200, 100));
        assert!(ctrl.resize(201, 100));
    }

    #[test]
    fn finish_success() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();

        ctrl.pan(vector![1.0, 1.0], &surface);
        let req = ctrl.request().unwrap();

        assert!(ctrl.finish(req.generation, Ok(bitmap()), &surface));
        assert_eq!(*surface.image.borrow(), Some(Some((2, 1))));
        assert_eq!(ctrl.transform, Transform::identity());
    }

    #[test]
    fn finish_failure_clears_image() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();
        let req = ctrl.request().unwrap();

        let err = mapserver::Error::InvalidExtent("x".into());
        assert!(ctrl.finish(req.generation, Err(err), &surface));
        assert_eq!(*surface.image.borrow(), Some(None));
    }

    #[test]
    fn finish_error_status_clears_image() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        use mapserver::{Client, MapSource};

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let mut request = Vec::new();
            let mut buf = [0; 1024];
            while !request.ends_with(b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            stream
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                )
                .unwrap();
        });

        let mut ctrl = MapController::default();
        let surface = RecordingSurface::default();

        ctrl.set_home(&format!("http://{addr}/map?mapext=0 0 200 100"), None)
            .unwrap();
        ctrl.resize(200, 100);
        ctrl.pan(vector![7.0, 3.0], &surface);

        let req = ctrl.request().unwrap();
        let result = Client::new().unwrap().fetch_map(&req.url);
        server.join().unwrap();

        assert!(matches!(&result, Err(mapserver::Error::Status(s)) if s.as_u16() == 500));

        assert!(ctrl.finish(req.generation, result, &surface));
        assert_eq!(*surface.image.borrow(), Some(None));
        assert_eq!(surface.transform.get(), Some(Transform::identity()));
        assert_eq!(ctrl.transform, Transform::identity());
    }

    #[test]
    fn finish_outdated() {
        let mut ctrl = controller();
        let surface = RecordingSurface::default();
        let req = ctrl.request().unwrap();

        ctrl.zoom(ZoomDirection::In, &surface);

        assert!(!ctrl.finish(req.generation, Ok(bitmap()), &surface));
        assert!(surface.image.borrow().is_none());
    }
}
