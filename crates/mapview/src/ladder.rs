use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::{MapConfig, MapViewState};
use crate::engine::{IconLoader, MapEngine, MapError, MapHandle, MapOptions, MarkerSpec, StyleFetcher};
use crate::icons::{PIN_ICONS, register_icons};
use crate::style::{circle_layer, flat_style, point_source, prepare_style, style_url};

/// Which rung of the ladder the preview ended on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapTier {
    /// Vector basemap from the year's style document.
    Styled,
    /// Solid background with a circle at the target.
    Flat,
    /// Nothing could be constructed; the map region is hidden.
    Hidden,
}

/// Collaborators shared by every initializer.
pub struct MapContext {
    pub engine: Rc<dyn MapEngine>,
    pub fetcher: Rc<dyn StyleFetcher>,
    pub icons: Rc<dyn IconLoader>,
    pub config: MapConfig,
    pub year: String,
    /// Page origin, e.g. `https://iburn.app`.
    pub origin: String,
    pub view: MapViewState,
    tier: Cell<Option<MapTier>>,
    map: RefCell<Option<Rc<dyn MapHandle>>>,
    on_hidden: Box<dyn Fn()>,
}

impl MapContext {
    fn options(&self, style: serde_json::Value) -> MapOptions {
        MapOptions {
            container: self.config.container.clone(),
            style,
            center: self.view.center,
            zoom: self.view.zoom,
            attribution_control: false,
        }
    }

    fn settle(&self, tier: MapTier) {
        tracing::info!(?tier, "map preview tier");
        self.tier.set(Some(tier));
    }

    /// Hold `map` until the ladder settles on it or moves past it.
    fn attach(&self, map: Rc<dyn MapHandle>) {
        *self.map.borrow_mut() = Some(map);
    }

    /// Tear down the current map so its listeners never fire again.
    fn discard_map(&self) {
        let map = self.map.borrow_mut().take();
        if let Some(map) = map {
            map.remove();
        }
    }

    fn add_label_marker(&self, map: &dyn MapHandle) -> Result<(), MapError> {
        let Some(label) = self.view.marker_label.as_deref() else {
            return Ok(());
        };
        map.add_marker(&MarkerSpec::labeled(
            self.view.center,
            &self.config.marker_color,
            label,
        ))
    }
}

/// One-shot hand-off to the next initializer.
///
/// Error channels can fire more than once; only the first report moves the
/// ladder down.
#[derive(Clone)]
pub struct Fallthrough {
    next: Rc<RefCell<Option<Box<dyn FnOnce(MapError)>>>>,
}

impl Fallthrough {
    fn new(next: impl FnOnce(MapError) + 'static) -> Self {
        Self {
            next: Rc::new(RefCell::new(Some(Box::new(next)))),
        }
    }

    pub fn trigger(&self, err: MapError) {
        let next = self.next.borrow_mut().take();
        match next {
            Some(next) => next(err),
            None => tracing::debug!("ignoring repeated map failure: {err}"),
        }
    }
}

/// A way of bringing up the map.
///
/// Synchronous failures are returned; asynchronous ones go through `fail`.
pub trait MapInitializer {
    fn name(&self) -> &'static str;
    fn start(&self, ctx: &Rc<MapContext>, fail: Fallthrough) -> Result<(), MapError>;
}

/// Year style document over the tile-archive protocol, with pin icons.
pub struct StyledBasemap;

impl MapInitializer for StyledBasemap {
    fn name(&self) -> &'static str {
        "styled"
    }

    fn start(&self, ctx: &Rc<MapContext>, fail: Fallthrough) -> Result<(), MapError> {
        ctx.engine.register_protocol(&ctx.config.tile_protocol)?;

        let url = style_url(&ctx.year, &ctx.config.style_name);
        tracing::debug!(url = %url, "fetching map style");

        let ctx_done = ctx.clone();
        ctx.fetcher.fetch_json(
            &url,
            Box::new(move |result| {
                let ctx = ctx_done;
                if let Err(err) = result.and_then(|style| build_styled(&ctx, style, fail.clone())) {
                    fail.trigger(err);
                }
            }),
        );
        Ok(())
    }
}

fn build_styled(
    ctx: &Rc<MapContext>,
    style: serde_json::Value,
    fail: Fallthrough,
) -> Result<(), MapError> {
    let style = prepare_style(style, &ctx.origin)?;
    let map = ctx.engine.create_map(&ctx.options(style))?;
    ctx.attach(map.clone());
    map.add_navigation_control(&ctx.config.navigation_position)?;

    let loaded_map = map.clone();
    let icon_loader = ctx.icons.clone();
    let base_path = ctx.config.icon_base_path.clone();
    let icon_size = ctx.config.icon_size;
    map.on_load(Box::new(move || {
        register_icons(
            loaded_map,
            icon_loader,
            PIN_ICONS,
            &base_path,
            icon_size,
            |_| {},
        );
    }));

    ctx.add_label_marker(map.as_ref())?;

    map.on_error(Box::new(move |err| {
        tracing::error!("map error: {err}");
        fail.trigger(err);
    }));

    ctx.settle(MapTier::Styled);
    Ok(())
}

/// Plain background and a circle marking the target.
pub struct FlatBackground;

impl MapInitializer for FlatBackground {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn start(&self, ctx: &Rc<MapContext>, _fail: Fallthrough) -> Result<(), MapError> {
        let map = ctx
            .engine
            .create_map(&ctx.options(flat_style(&ctx.config.background_color)))?;
        ctx.attach(map.clone());

        let loaded_map = map.clone();
        let center = ctx.view.center;
        let radius = ctx.config.circle_radius;
        let color = ctx.config.circle_color.clone();
        map.on_load(Box::new(move || {
            let added = loaded_map
                .add_source("point", &point_source(center))
                .and_then(|_| loaded_map.add_layer(&circle_layer("point", "point", radius, &color)));
            if let Err(err) = added {
                tracing::warn!("failed to add location circle: {err}");
            }
        }));

        ctx.add_label_marker(map.as_ref())?;
        ctx.settle(MapTier::Flat);
        Ok(())
    }
}

/// Map preview for one page load.
pub struct MapPreview {
    ctx: Rc<MapContext>,
    initializers: Rc<Vec<Box<dyn MapInitializer>>>,
}

impl MapPreview {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Rc<dyn MapEngine>,
        fetcher: Rc<dyn StyleFetcher>,
        icons: Rc<dyn IconLoader>,
        config: MapConfig,
        year: impl Into<String>,
        origin: impl Into<String>,
        view: MapViewState,
        on_hidden: impl Fn() + 'static,
    ) -> Self {
        let initializers: Vec<Box<dyn MapInitializer>> =
            vec![Box::new(StyledBasemap), Box::new(FlatBackground)];
        Self {
            ctx: Rc::new(MapContext {
                engine,
                fetcher,
                icons,
                config,
                year: year.into(),
                origin: origin.into(),
                view,
                tier: Cell::new(None),
                map: RefCell::new(None),
                on_hidden: Box::new(on_hidden),
            }),
            initializers: Rc::new(initializers),
        }
    }

    /// Replace the default ladder.
    pub fn with_initializers(mut self, initializers: Vec<Box<dyn MapInitializer>>) -> Self {
        self.initializers = Rc::new(initializers);
        self
    }

    /// Walk the ladder from the top.
    pub fn initialize(&self) {
        run_from(self.ctx.clone(), self.initializers.clone(), 0);
    }

    /// `None` while the first rung is still pending.
    pub fn tier(&self) -> Option<MapTier> {
        self.ctx.tier.get()
    }

    pub fn map(&self) -> Option<Rc<dyn MapHandle>> {
        self.ctx.map.borrow().clone()
    }
}

fn run_from(ctx: Rc<MapContext>, initializers: Rc<Vec<Box<dyn MapInitializer>>>, index: usize) {
    let Some(init) = initializers.get(index) else {
        tracing::error!("every map initializer failed; hiding map");
        ctx.settle(MapTier::Hidden);
        (ctx.on_hidden)();
        return;
    };

    let name = init.name();
    let next_ctx = ctx.clone();
    let next_inits = initializers.clone();
    let fail = Fallthrough::new(move |err| {
        tracing::warn!(initializer = name, "map initializer failed: {err}");
        next_ctx.discard_map();
        run_from(next_ctx, next_inits, index + 1);
    });

    if let Err(err) = init.start(&ctx, fail.clone()) {
        fail.trigger(err);
    }
}
