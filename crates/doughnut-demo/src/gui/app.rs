use crate::config;
use crate::events::AppEvent;
use crate::gui::schedule;
use crate::gui::surface::{self, DrawingAreaProvider, FrameSlot};
use crate::gui::theme;
use doughnut::{ChartConfig, Doughnut, Point};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::path::PathBuf;

pub struct AppModel {
    chart: Doughnut,
    path: PathBuf,
    drawing_area: gtk::DrawingArea,
    frame: FrameSlot,
}

#[derive(Debug)]
pub enum AppMsg {
    Resized,
    Pointer(Point),
    Reverse,
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

pub struct AppInit {
    pub path: PathBuf,
    pub chart: ChartConfig,
    pub events: async_channel::Receiver<AppEvent>,
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Doughnut"),

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 8,
                set_margin_all: 12,

                #[local_ref]
                drawing_area -> gtk::DrawingArea {
                    set_halign: gtk::Align::Center,
                    set_valign: gtk::Align::Center,
                    add_css_class: "doughnut-canvas",

                    add_controller = gtk::GestureClick {
                        connect_pressed[sender] => move |_, _, x, y| {
                            sender.input(AppMsg::Pointer(Point::new(x, y)));
                        }
                    },

                    connect_resize[sender] => move |_, _, _| {
                        sender.input(AppMsg::Resized);
                    },
                },

                gtk::Label {
                    add_css_class: "doughnut-values",
                    #[watch]
                    set_label: &model.summary(),
                },

                gtk::Button {
                    set_label: "Reverse values",
                    connect_clicked => AppMsg::Reverse,
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit { path, chart, events } = init;

        theme::load_css();

        let drawing_area = gtk::DrawingArea::new();
        let frame = FrameSlot::default();
        surface::install_draw_func(&drawing_area, frame.clone());
        resize_canvas(&drawing_area, &chart);

        let chart = build_chart(chart, &drawing_area, &frame);
        chart.init();

        let model = AppModel {
            chart,
            path,
            drawing_area: drawing_area.clone(),
            frame,
        };

        let widgets = view_output!();

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = events.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Resized => {
                // a new allocation needs a new backing image
                self.chart.init();
            }
            AppMsg::Pointer(point) => {
                let hit = self.chart.handle_pointer(point);
                // native surfaces skip present(), so the hook never fires
                self.drawing_area.queue_draw();
                log::debug!("Pointer at ({:.1}, {:.1}) selects {:?}", point.x, point.y, hit);
            }
            AppMsg::Reverse => {
                let current = self.chart.config();
                let n = current.values.len();
                let active = self
                    .chart
                    .active_index()
                    .filter(|&i| i < n)
                    .map(|i| n - 1 - i);
                let mut values = current.values.clone();
                values.reverse();

                if let Err(e) = self.chart.update(current.with_values(values).with_active(active)) {
                    log::error!("Failed to reverse values: {}", e);
                }
            }
            AppMsg::ConfigReload => match config::load_config(&self.path) {
                Ok(c) => self.apply_config(c.chart),
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }

    fn shutdown(&mut self, _widgets: &mut Self::Widgets, _output: relm4::Sender<Self::Output>) {
        self.chart.dispose();
    }
}

impl AppModel {
    fn summary(&self) -> String {
        let active = self.chart.active_index();
        let values: Vec<String> = self
            .chart
            .config()
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if Some(i) == active {
                    format!("[{}]", v)
                } else {
                    v.to_string()
                }
            })
            .collect();

        if values.is_empty() {
            "No values".to_string()
        } else {
            values.join("  ")
        }
    }

    fn apply_config(&mut self, next: ChartConfig) {
        if next.surface == self.chart.config().surface {
            if self.chart.update(next.clone()).is_ok() {
                resize_canvas(&self.drawing_area, &next);
            }
            return;
        }

        // the tick source follows the surface kind, so rebuild the chart
        if let Err(e) = next.validate() {
            log::warn!("Rejected chart config: {}", e);
            return;
        }
        log::info!("Switching surface to {}", next.surface);
        self.chart.dispose();
        resize_canvas(&self.drawing_area, &next);
        self.chart = build_chart(next, &self.drawing_area, &self.frame);
        self.chart.init();
    }
}

fn resize_canvas(area: &gtk::DrawingArea, config: &ChartConfig) {
    area.set_content_width(config.width.round() as i32);
    area.set_content_height(config.height.round() as i32);
}

fn build_chart(config: ChartConfig, area: &gtk::DrawingArea, frame: &FrameSlot) -> Doughnut {
    let make = |config: ChartConfig| {
        let scheduler = schedule::scheduler_for(config.surface, area);
        let provider = Box::new(DrawingAreaProvider::new(area.clone(), frame.clone()));
        Doughnut::new(config, scheduler, provider)
    };

    match make(config) {
        Ok(chart) => chart,
        Err(e) => {
            log::error!("Invalid chart config, using defaults: {}", e);
            make(ChartConfig::default()).expect("default chart config is valid")
        }
    }
}
