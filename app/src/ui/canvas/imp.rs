use std::cell::{Cell, RefCell};

use gtk::{
    gdk, glib, graphene,
    prelude::{SnapshotExt, WidgetExt},
    subclass::{
        prelude::{ObjectImpl, ObjectSubclass, ObjectSubclassExt},
        widget::WidgetImpl,
    },
};
use mapserver::Bitmap;
use nalgebra::{vector, Vector2};

use crate::types::{Bounds, Transform};

#[derive(Debug)]
struct Image {
    texture: gdk::MemoryTexture,
    size: Vector2<f64>,
}

impl Image {
    fn from_bitmap(bitmap: Bitmap) -> Option<Self> {
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return None;
        }

        let size = vector![bitmap.width() as f64, bitmap.height() as f64];
        let (width, height, stride) = (bitmap.width(), bitmap.height(), bitmap.stride());

        // transfer buffer ownership to GTK/GDK
        let bytes = glib::Bytes::from_owned(bitmap.into_data());
        let texture = gdk::MemoryTexture::new(
            width as _,
            height as _,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            stride as _,
        );

        Some(Self { texture, size })
    }
}

#[derive(Debug, Default)]
pub struct CanvasWidget {
    image: RefCell<Option<Image>>,
    transform: Cell<Transform>,
}

impl CanvasWidget {
    pub fn set_image(&self, bitmap: Option<Bitmap>) {
        self.image.replace(bitmap.and_then(Image::from_bitmap));
    }

    pub fn set_transform(&self, transform: Transform) {
        self.transform.set(transform);
    }
}

#[glib::object_subclass]
impl ObjectSubclass for CanvasWidget {
    const NAME: &'static str = "MapCanvas";
    type Type = super::CanvasWidget;
    type ParentType = gtk::Widget;
}

impl ObjectImpl for CanvasWidget {}

impl WidgetImpl for CanvasWidget {
    fn snapshot(&self, snapshot: &gtk::Snapshot) {
        let obj = self.obj();

        // clip drawing to widget area
        let bounds = graphene::Rect::new(0.0, 0.0, obj.width() as _, obj.height() as _);
        snapshot.push_clip(&bounds);

        // background, visible where the map image does not cover the widget
        snapshot.append_color(&gdk::RGBA::new(0.92, 0.92, 0.92, 1.0), &bounds);

        if let Some(image) = self.image.borrow().as_ref() {
            let rect = self.transform.get().apply(Bounds::from_size(image.size));
            snapshot.append_texture(&image.texture, &rect.into());
        }

        snapshot.pop();
    }
}
