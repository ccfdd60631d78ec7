use gtk::glib;
use gtk::prelude::WidgetExt;
use gtk::subclass::prelude::ObjectSubclassIsExt;

use mapserver::Bitmap;
use nalgebra::{vector, Vector2};

use crate::core::Surface;
use crate::types::Transform;

mod imp;

glib::wrapper! {
    pub struct CanvasWidget(ObjectSubclass<imp::CanvasWidget>)
        @extends gtk::Widget,
        @implements gtk::Buildable;
}

impl CanvasWidget {
    pub fn new() -> Self {
        glib::Object::new()
    }

    pub fn clear(&self) {
        self.set_image(None);
        self.set_transform(Transform::identity());
    }
}

impl Default for CanvasWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for CanvasWidget {
    fn pixel_size(&self) -> Vector2<i32> {
        vector![self.width(), self.height()]
    }

    fn set_transform(&self, transform: Transform) {
        self.imp().set_transform(transform);
        self.queue_draw();
    }

    fn set_image(&self, image: Option<Bitmap>) {
        self.imp().set_image(image);
        self.queue_draw();
    }
}
