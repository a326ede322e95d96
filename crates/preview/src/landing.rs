use std::cell::RefCell;
use std::rc::Rc;

use linking::{EntityType, LinkIntent, Navigator, Platform, TriggerPlan, attempt_deep_link};
use mapview::{IconLoader, MapEngine, MapPreview, MapTier, MapViewState, StyleFetcher};
use runtime::{Task, TaskScheduler};

use crate::config::LandingConfig;
use crate::content::PreviewContent;
use crate::event_time::DisplayZone;
use crate::image::{absolute_url, preview_image_id, preview_image_path};
use crate::page_meta::PageMeta;
use crate::state::{PresenterState, RevealLatch};
use crate::surface::{ElementId, ImageProbe, MetaField, PageEnv, PageSurface};

pub const DEFAULT_MARKER_LABEL: &str = "Location";

/// Browser-side collaborators of a landing page.
#[derive(Clone)]
pub struct LandingServices {
    pub surface: Rc<dyn PageSurface>,
    pub navigator: Rc<dyn Navigator>,
    pub scheduler: Rc<dyn TaskScheduler>,
    pub images: Rc<dyn ImageProbe>,
    pub map_engine: Rc<dyn MapEngine>,
    pub style_fetcher: Rc<dyn StyleFetcher>,
    pub icon_loader: Rc<dyn IconLoader>,
}

/// One page load: resolves the link, tries the app, and reveals the preview.
pub struct LandingPage {
    intent: LinkIntent,
    env: PageEnv,
    config: LandingConfig,
    display_zone: Rc<dyn DisplayZone>,
    services: LandingServices,
    latch: RevealLatch,
    map: RefCell<Option<MapPreview>>,
}

impl LandingPage {
    /// `local_zone` is the viewer's time zone, used unless the config pins an offset.
    pub fn new(
        entity_type: EntityType,
        env: PageEnv,
        config: LandingConfig,
        local_zone: Rc<dyn DisplayZone>,
        services: LandingServices,
    ) -> Rc<Self> {
        let intent = LinkIntent::resolve(entity_type, &env.search, &config.link);
        let display_zone = config.display_zone(local_zone);
        Rc::new(Self {
            intent,
            env,
            config,
            display_zone,
            services,
            latch: RevealLatch::new(),
            map: RefCell::new(None),
        })
    }

    pub fn intent(&self) -> &LinkIntent {
        &self.intent
    }

    pub fn state(&self) -> PresenterState {
        self.latch.state()
    }

    pub fn map_tier(&self) -> Option<MapTier> {
        self.map.borrow().as_ref().and_then(MapPreview::tier)
    }

    pub fn page_meta(&self) -> PageMeta {
        PageMeta::from_intent(&self.intent, &self.env.href, &self.config.link)
    }

    pub fn content(&self) -> PreviewContent {
        PreviewContent::from_intent(&self.intent, self.display_zone.as_ref())
    }

    pub fn trigger_plan(&self) -> TriggerPlan {
        let platform = Platform::from_user_agent(&self.env.user_agent);
        TriggerPlan::build(&self.intent, platform, &self.env.href, &self.config.link)
    }

    /// Page-load sequence: metadata, first deep-link attempt, and the
    /// reveal timer. The timer is never cancelled.
    pub fn start(self: &Rc<Self>) {
        self.page_meta().apply(self.services.surface.as_ref());
        self.open_app();

        let page = self.clone();
        self.services.scheduler.schedule(Task::new(
            "preview.reveal",
            self.config.link.fallback_timeout(),
            move || page.reveal(),
        ));
    }

    /// Fire the deep-link sequence. Also bound to the open-app button.
    pub fn open_app(&self) {
        attempt_deep_link(
            &self.trigger_plan(),
            self.services.navigator.clone(),
            self.services.scheduler.as_ref(),
        );
    }

    /// Move to `Revealed` and populate the preview. Later calls do nothing.
    pub fn reveal(self: &Rc<Self>) {
        if !self.latch.reveal() {
            return;
        }
        tracing::info!(entity_type = %self.intent.entity_type, "revealing web preview");

        let surface = self.services.surface.as_ref();
        surface.set_visible(ElementId::LoadingState, false);
        surface.set_visible(ElementId::ContentPreview, true);

        let content = self.content();
        content.apply(surface);
        self.load_image();

        if let Some(center) = self.intent.coordinates() {
            surface.set_visible(ElementId::MapContainer, true);
            let label = self
                .intent
                .meta("title")
                .unwrap_or(DEFAULT_MARKER_LABEL)
                .to_string();
            self.start_map(MapViewState::new(center, self.config.map.zoom, Some(label)));
        }
    }

    fn load_image(&self) {
        let Some(image_id) = preview_image_id(&self.intent) else {
            return;
        };
        let path = preview_image_path(&self.intent.year, image_id);
        let absolute = absolute_url(&self.env.origin, &path);
        let surface = self.services.surface.clone();
        let src = path.clone();

        self.services.images.probe(
            &path,
            Box::new(move |result| match result {
                Ok(()) => {
                    surface.set_image_src(ElementId::PreviewImage, &src);
                    surface.set_visible(ElementId::PreviewImage, true);
                    surface.set_visible(ElementId::ImagePlaceholder, false);
                    surface.set_meta(MetaField::OgImage, &absolute);
                    surface.set_meta(MetaField::TwitterImage, &absolute);
                }
                Err(err) => tracing::info!("{err}; keeping placeholder"),
            }),
        );
    }

    fn start_map(&self, view: MapViewState) {
        let surface = self.services.surface.clone();
        let preview = MapPreview::new(
            self.services.map_engine.clone(),
            self.services.style_fetcher.clone(),
            self.services.icon_loader.clone(),
            self.config.map.clone(),
            self.intent.year.clone(),
            self.env.origin.clone(),
            view,
            move || surface.set_visible(ElementId::MapContainer, false),
        );
        preview.initialize();
        *self.map.borrow_mut() = Some(preview);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use mapview::{IconError, IconImage, MapError, MapHandle, MapOptions, MarkerSpec};
    use pretty_assertions::assert_eq;
    use runtime::ManualScheduler;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSurface {
        text: RefCell<BTreeMap<ElementId, String>>,
        meta: RefCell<BTreeMap<MetaField, String>>,
        visible: RefCell<BTreeMap<ElementId, bool>>,
        images: RefCell<BTreeMap<ElementId, String>>,
    }

    impl PageSurface for FakeSurface {
        fn set_text(&self, id: ElementId, text: &str) {
            self.text.borrow_mut().insert(id, text.to_string());
        }
        fn set_icon_text(&self, id: ElementId, _icon_class: &str, text: &str) {
            self.text.borrow_mut().insert(id, text.to_string());
        }
        fn set_meta(&self, field: MetaField, content: &str) {
            self.meta.borrow_mut().insert(field, content.to_string());
        }
        fn set_visible(&self, id: ElementId, visible: bool) {
            self.visible.borrow_mut().insert(id, visible);
        }
        fn set_image_src(&self, id: ElementId, src: &str) {
            self.images.borrow_mut().insert(id, src.to_string());
        }
    }

    impl FakeSurface {
        fn text(&self, id: ElementId) -> Option<String> {
            self.text.borrow().get(&id).cloned()
        }
        fn meta(&self, field: MetaField) -> Option<String> {
            self.meta.borrow().get(&field).cloned()
        }
        fn visible(&self, id: ElementId) -> Option<bool> {
            self.visible.borrow().get(&id).copied()
        }
    }

    #[derive(Default)]
    struct FakeNavigator {
        frames: RefCell<Vec<String>>,
        redirects: RefCell<Vec<String>>,
    }

    impl Navigator for FakeNavigator {
        fn open_hidden_frame(&self, url: &str) {
            self.frames.borrow_mut().push(url.to_string());
        }
        fn navigate(&self, url: &str) {
            self.redirects.borrow_mut().push(url.to_string());
        }
    }

    struct FakeImages {
        available: bool,
        requests: RefCell<Vec<String>>,
    }

    impl ImageProbe for FakeImages {
        fn probe(&self, url: &str, done: Box<dyn FnOnce(Result<(), crate::surface::ImageError>)>) {
            self.requests.borrow_mut().push(url.to_string());
            if self.available {
                done(Ok(()));
            } else {
                done(Err(crate::surface::ImageError::NotFound(url.to_string())));
            }
        }
    }

    #[derive(Default)]
    struct NullMap {
        markers: RefCell<Vec<MarkerSpec>>,
    }

    impl MapHandle for NullMap {
        fn add_navigation_control(&self, _position: &str) -> Result<(), MapError> {
            Ok(())
        }
        fn on_load(&self, _callback: Box<dyn FnOnce()>) {}
        fn on_error(&self, _callback: Box<dyn FnMut(MapError)>) {}
        fn add_marker(&self, marker: &MarkerSpec) -> Result<(), MapError> {
            self.markers.borrow_mut().push(marker.clone());
            Ok(())
        }
        fn add_source(&self, _id: &str, _source: &Value) -> Result<(), MapError> {
            Ok(())
        }
        fn add_layer(&self, _layer: &Value) -> Result<(), MapError> {
            Ok(())
        }
        fn has_image(&self, _name: &str) -> bool {
            false
        }
        fn add_image(&self, _name: &str, _image: &IconImage) -> Result<(), MapError> {
            Ok(())
        }
        fn remove(&self) {}
    }

    #[derive(Default)]
    struct FakeEngine {
        broken: bool,
        maps: RefCell<Vec<(MapOptions, Rc<NullMap>)>>,
    }

    impl MapEngine for FakeEngine {
        fn register_protocol(&self, _name: &str) -> Result<(), MapError> {
            Ok(())
        }
        fn create_map(&self, options: &MapOptions) -> Result<Rc<dyn MapHandle>, MapError> {
            if self.broken {
                return Err(MapError::Construct("no webgl".to_string()));
            }
            let map = Rc::new(NullMap::default());
            self.maps.borrow_mut().push((options.clone(), map.clone()));
            Ok(map as Rc<dyn MapHandle>)
        }
    }

    struct FakeFetcher {
        ok: bool,
    }

    impl StyleFetcher for FakeFetcher {
        fn fetch_json(&self, _url: &str, done: Box<dyn FnOnce(Result<Value, MapError>)>) {
            if self.ok {
                done(Ok(json!({"version": 8, "sources": {}, "layers": []})));
            } else {
                done(Err(MapError::Fetch("503".to_string())));
            }
        }
    }

    struct NoIcons;

    impl IconLoader for NoIcons {
        fn load(&self, _url: &str, _size: u32, done: Box<dyn FnOnce(Result<IconImage, IconError>)>) {
            done(Err(IconError::Fetch("offline".to_string())));
        }
    }

    struct Harness {
        surface: Rc<FakeSurface>,
        navigator: Rc<FakeNavigator>,
        scheduler: Rc<ManualScheduler>,
        images: Rc<FakeImages>,
        engine: Rc<FakeEngine>,
        page: Rc<LandingPage>,
    }

    struct Setup<'a> {
        entity: &'a str,
        search: &'a str,
        user_agent: &'a str,
        image_available: bool,
        style_ok: bool,
        engine_broken: bool,
    }

    impl Default for Setup<'_> {
        fn default() -> Self {
            Self {
                entity: "art",
                search: "",
                user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X)",
                image_available: true,
                style_ok: true,
                engine_broken: false,
            }
        }
    }

    fn harness(setup: Setup<'_>) -> Harness {
        let surface = Rc::new(FakeSurface::default());
        let navigator = Rc::new(FakeNavigator::default());
        let scheduler = Rc::new(ManualScheduler::new());
        let images = Rc::new(FakeImages {
            available: setup.image_available,
            requests: RefCell::new(Vec::new()),
        });
        let engine = Rc::new(FakeEngine {
            broken: setup.engine_broken,
            ..Default::default()
        });
        let services = LandingServices {
            surface: surface.clone(),
            navigator: navigator.clone(),
            scheduler: scheduler.clone(),
            images: images.clone(),
            map_engine: engine.clone(),
            style_fetcher: Rc::new(FakeFetcher { ok: setup.style_ok }),
            icon_loader: Rc::new(NoIcons),
        };
        let env = PageEnv {
            href: format!("https://iburn.app/{}/{}", setup.entity, setup.search),
            origin: "https://iburn.app".to_string(),
            search: setup.search.to_string(),
            user_agent: setup.user_agent.to_string(),
        };
        let page = LandingPage::new(
            EntityType::parse(setup.entity),
            env,
            LandingConfig::default(),
            Rc::new(FixedOffset::west_opt(7 * 3600).unwrap()),
            services,
        );
        Harness {
            surface,
            navigator,
            scheduler,
            images,
            engine,
            page,
        }
    }

    #[test]
    fn start_writes_meta_and_fires_frame_immediately() {
        let h = harness(Setup {
            search: "?uid=a2I&title=Temple+of+Glass",
            ..Default::default()
        });
        h.page.start();

        assert_eq!(h.surface.text(ElementId::PageTitle).as_deref(), Some("Temple of Glass"));
        assert_eq!(
            h.surface.meta(MetaField::IosAppBanner).as_deref(),
            Some("app-id=388169740, app-argument=iburn://art/a2I")
        );
        assert_eq!(
            *h.navigator.frames.borrow(),
            vec!["iburn://art/a2I?title=Temple+of+Glass".to_string()]
        );
        assert!(h.navigator.redirects.borrow().is_empty());
        assert_eq!(h.page.state(), PresenterState::Loading);
    }

    #[test]
    fn reveal_happens_at_fallback_timeout_regardless_of_link() {
        let h = harness(Setup {
            search: "?uid=a2I",
            ..Default::default()
        });
        h.page.start();

        h.scheduler.advance_ms(2499);
        assert_eq!(h.page.state(), PresenterState::Loading);
        assert_eq!(h.navigator.redirects.borrow().len(), 1);

        h.scheduler.advance_ms(1);
        assert_eq!(h.page.state(), PresenterState::Revealed);
        assert!(
            h.scheduler
                .history()
                .contains(&(Duration::from_millis(2500), "preview.reveal"))
        );
        assert_eq!(h.surface.visible(ElementId::LoadingState), Some(false));
        assert_eq!(h.surface.visible(ElementId::ContentPreview), Some(true));
    }

    #[test]
    fn android_gets_intent_redirect() {
        let h = harness(Setup {
            search: "?uid=c1",
            entity: "camp",
            user_agent: "Mozilla/5.0 (Linux; Android 14)",
            ..Default::default()
        });
        h.page.start();
        h.scheduler.advance_ms(200);
        let redirects = h.navigator.redirects.borrow();
        assert_eq!(redirects.len(), 2);
        assert_eq!(redirects[0], "iburn://camp/c1");
        assert!(redirects[1].starts_with("intent://camp/c1#Intent;"));
    }

    #[test]
    fn open_app_retries_full_sequence() {
        let h = harness(Setup {
            search: "?uid=a2I",
            ..Default::default()
        });
        h.page.start();
        h.scheduler.advance_ms(3000);
        h.page.open_app();
        h.scheduler.advance_ms(100);
        assert_eq!(h.navigator.frames.borrow().len(), 2);
        assert_eq!(h.navigator.redirects.borrow().len(), 2);
    }

    #[test]
    fn reveal_populates_event_details() {
        let h = harness(Setup {
            entity: "event",
            search: "?uid=e1&host_id=c5&title=Sunrise+Yoga&host=Camp+Stretch&all_day=true&addr=9%3A00+%26+C",
            ..Default::default()
        });
        h.page.start();
        h.scheduler.advance_ms(2500);

        assert_eq!(h.surface.text(ElementId::ContentTitle).as_deref(), Some("Sunrise Yoga"));
        assert_eq!(h.surface.text(ElementId::LocationText).as_deref(), Some("9:00 & C"));
        assert_eq!(
            h.surface.text(ElementId::EventHost).as_deref(),
            Some("Hosted by Camp Stretch")
        );
        assert_eq!(h.surface.text(ElementId::EventTime).as_deref(), Some("All Day Event"));
        assert_eq!(h.surface.visible(ElementId::EventDetails), Some(true));
        assert_eq!(*h.images.requests.borrow(), vec!["/data/2025/images/c5.jpg".to_string()]);
    }

    #[test]
    fn loaded_image_updates_share_cards() {
        let h = harness(Setup {
            search: "?uid=a2I&year=2024",
            ..Default::default()
        });
        h.page.reveal();
        assert_eq!(
            h.surface.images.borrow().get(&ElementId::PreviewImage).cloned(),
            Some("/data/2024/images/a2I.jpg".to_string())
        );
        assert_eq!(h.surface.visible(ElementId::ImagePlaceholder), Some(false));
        assert_eq!(
            h.surface.meta(MetaField::OgImage).as_deref(),
            Some("https://iburn.app/data/2024/images/a2I.jpg")
        );
        assert_eq!(
            h.surface.meta(MetaField::TwitterImage).as_deref(),
            Some("https://iburn.app/data/2024/images/a2I.jpg")
        );
    }

    #[test]
    fn missing_image_keeps_placeholder() {
        let h = harness(Setup {
            search: "?uid=a2I",
            image_available: false,
            ..Default::default()
        });
        h.page.reveal();
        assert_eq!(h.surface.visible(ElementId::ImagePlaceholder), None);
        assert_eq!(h.surface.meta(MetaField::OgImage), None);
    }

    #[test]
    fn pins_skip_image_and_show_coordinates() {
        let h = harness(Setup {
            entity: "pin",
            search: "?lat=40.7864&lng=-119.2065",
            ..Default::default()
        });
        h.page.reveal();
        assert!(h.images.requests.borrow().is_empty());
        assert_eq!(
            h.surface.text(ElementId::LocationText).as_deref(),
            Some("40.7864, -119.2065")
        );
        assert_eq!(h.surface.visible(ElementId::MapContainer), Some(true));
        assert_eq!(h.page.map_tier(), Some(MapTier::Styled));

        let maps = h.engine.maps.borrow();
        let (options, map) = &maps[0];
        assert_eq!(options.center.to_array(), [-119.2065, 40.7864]);
        assert_eq!(options.zoom, 14.0);
        assert_eq!(
            map.markers.borrow()[0].popup_html.as_deref(),
            Some("<b>Location</b>")
        );
    }

    #[test]
    fn style_failure_still_places_labeled_marker() {
        let h = harness(Setup {
            search: "?uid=a1&lat=40.78&lng=-119.21&title=Big+Rig",
            style_ok: false,
            ..Default::default()
        });
        h.page.reveal();
        assert_eq!(h.page.map_tier(), Some(MapTier::Flat));
        let maps = h.engine.maps.borrow();
        assert_eq!(maps[0].0.style["layers"][0]["type"], "background");
        assert_eq!(
            maps[0].1.markers.borrow()[0].popup_html.as_deref(),
            Some("<b>Big Rig</b>")
        );
    }

    #[test]
    fn broken_engine_hides_map_region() {
        let h = harness(Setup {
            search: "?uid=a1&lat=40.78&lng=-119.21",
            engine_broken: true,
            ..Default::default()
        });
        h.page.reveal();
        assert_eq!(h.page.map_tier(), Some(MapTier::Hidden));
        assert_eq!(h.surface.visible(ElementId::MapContainer), Some(false));
    }

    #[test]
    fn no_coordinates_means_no_map() {
        let h = harness(Setup {
            search: "?uid=a1&lat=40.78",
            ..Default::default()
        });
        h.page.reveal();
        assert_eq!(h.page.map_tier(), None);
        assert_eq!(h.surface.visible(ElementId::MapContainer), None);
        assert_eq!(h.surface.visible(ElementId::ContentLocation), Some(false));
    }

    #[test]
    fn reveal_runs_once() {
        let h = harness(Setup {
            search: "?uid=a1",
            ..Default::default()
        });
        h.page.reveal();
        h.page.reveal();
        assert_eq!(h.images.requests.borrow().len(), 1);
    }
}
