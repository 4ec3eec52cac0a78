//! Device geolocation watch (wasm only)
//!
//! `GeolocationWatch` owns the JS callbacks and the watch id. Dropping it
//! calls `clearWatch`, so the subscription lives exactly as long as the handle.
//! Never drop a watch from inside one of its own callbacks; defer it instead.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Geolocation, GeolocationPosition, GeolocationPositionError};

use crate::sim::LatLng;

/// An active `navigator.geolocation.watchPosition` subscription
pub struct GeolocationWatch {
    geolocation: Geolocation,
    watch_id: i32,
    _on_position: Closure<dyn FnMut(JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

impl std::fmt::Debug for GeolocationWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeolocationWatch")
            .field("watch_id", &self.watch_id)
            .finish()
    }
}

impl GeolocationWatch {
    /// Subscribe to position updates
    ///
    /// `on_position` runs once per fix; `on_error` on denial/timeout/unavailable.
    pub fn start(
        mut on_position: impl FnMut(LatLng) + 'static,
        mut on_error: impl FnMut(String) + 'static,
    ) -> Result<Self, String> {
        let geolocation = web_sys::window()
            .ok_or_else(|| "no window".to_string())?
            .navigator()
            .geolocation()
            .map_err(|_| "geolocation is not supported by this browser".to_string())?;

        let on_position = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let position: GeolocationPosition = value.unchecked_into();
            let coords = position.coords();
            on_position(LatLng::new(coords.latitude(), coords.longitude()));
        });
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let error: GeolocationPositionError = value.unchecked_into();
            on_error(error.message());
        });

        let watch_id = geolocation
            .watch_position_with_error_callback(
                on_position.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
            )
            .map_err(|e| format!("watchPosition failed: {:?}", e))?;
        log::info!("Geolocation watch {} started", watch_id);

        Ok(Self {
            geolocation,
            watch_id,
            _on_position: on_position,
            _on_error: on_error,
        })
    }
}

impl Drop for GeolocationWatch {
    fn drop(&mut self) {
        self.geolocation.clear_watch(self.watch_id);
        log::info!("Geolocation watch {} cleared", self.watch_id);
    }
}
