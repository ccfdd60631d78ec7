use adw::subclass::prelude::AdwApplicationWindowImpl;
use gtk::gio::SimpleAction;
use gtk::glib::clone;
use gtk::glib::subclass::InitializingObject;
use gtk::prelude::ActionMapExt;
use gtk::subclass::prelude::{
    ApplicationWindowImpl, CompositeTemplateClass, CompositeTemplateInitializingExt, ObjectImpl,
    ObjectImplExt, ObjectSubclass, ObjectSubclassExt, WidgetImpl, WindowImpl,
};
use gtk::subclass::widget::WidgetClassSubclassExt;
use gtk::{glib, CompositeTemplate, TemplateChild};
use mapserver::ZoomDirection;

use crate::ui::viewport::ViewportWidget;

#[derive(CompositeTemplate, Default)]
#[template(resource = "/io/mxnluz/mapview/ui/appwindow.ui")]
pub struct AppWindow {
    #[template_child]
    viewport: TemplateChild<ViewportWidget>,

    #[template_child]
    window_title: TemplateChild<adw::WindowTitle>,
}

impl AppWindow {
    pub fn viewport(&self) -> &ViewportWidget {
        &self.viewport
    }

    fn update_subtitle(&self) {
        match self.viewport.extent() {
            Some(extent) => self.window_title.set_subtitle(&extent.to_string()),
            None => self.window_title.set_subtitle("No Map Selected"),
        }
    }
}

#[glib::object_subclass]
impl ObjectSubclass for AppWindow {
    const NAME: &'static str = "AppWindow";
    type Type = super::AppWindow;
    type ParentType = adw::ApplicationWindow;

    fn class_init(klass: &mut Self::Class) {
        klass.bind_template();
    }

    fn instance_init(obj: &InitializingObject<Self>) {
        obj.init_template();
    }
}

impl ObjectImpl for AppWindow {
    fn constructed(&self) {
        self.parent_constructed();

        let action_zoom_in = SimpleAction::new("zoom-in", None);
        action_zoom_in.connect_activate(clone!(@weak self as win => move |_, _| {
            win.viewport.zoom(ZoomDirection::In);
        }));

        let action_zoom_out = SimpleAction::new("zoom-out", None);
        action_zoom_out.connect_activate(clone!(@weak self as win => move |_, _| {
            win.viewport.zoom(ZoomDirection::Out);
        }));

        let action_zoom_reset = SimpleAction::new("zoom-reset", None);
        action_zoom_reset.connect_activate(clone!(@weak self as win => move |_, _| {
            win.viewport.reset();
        }));

        self.viewport
            .connect_extent_changed(clone!(@weak self as win => move |_| {
                win.update_subtitle();
            }));

        self.obj().add_action(&action_zoom_in);
        self.obj().add_action(&action_zoom_out);
        self.obj().add_action(&action_zoom_reset);

        self.update_subtitle();
    }
}

impl WidgetImpl for AppWindow {}
impl WindowImpl for AppWindow {}
impl ApplicationWindowImpl for AppWindow {}
impl AdwApplicationWindowImpl for AppWindow {}
