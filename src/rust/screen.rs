use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierError, Image};
use crate::orchestrator::{ClassificationTask, Completion, Orchestrator, Outcome};

/// Where a picture comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    PhotoLibrary,
    Camera,
}

/// Platform media picking, camera capture and photo library alike.
pub trait MediaPicker {
    fn is_source_available(&self, source: ImageSource) -> bool;

    /// Lets the user pick an image. `None` when nothing usable came back.
    fn pick(&mut self, source: ImageSource) -> Option<Image>;
}

/// A modal message with a title and a (possibly empty) body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: String::new(),
        }
    }
}

/// The state of the single screen: the selected image, the result label and
/// any alert on top.
///
/// All updates happen on the task that owns the screen. Completions from
/// superseded calls are dropped so a slow earlier call cannot overwrite a
/// newer result.
#[derive(Debug)]
pub struct Screen {
    orchestrator: Orchestrator,
    image: Option<Image>,
    result_text: String,
    alert: Option<Alert>,
}

impl Screen {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            image: None,
            result_text: String::new(),
            alert: None,
        }
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub fn set_image(&mut self, image: Option<Image>) {
        self.image = image;
    }

    fn show_alert(&mut self, title: &str) {
        self.alert = Some(Alert::new(title));
    }

    /// Captures a photo with the camera, if the device has one.
    pub fn take_photo(&mut self, picker: &mut dyn MediaPicker) {
        if !picker.is_source_available(ImageSource::Camera) {
            self.show_alert("Camera doesn't exist");
            return;
        }
        self.select_image_from(ImageSource::Camera, picker);
    }

    pub fn choose_photo(&mut self, picker: &mut dyn MediaPicker) {
        self.select_image_from(ImageSource::PhotoLibrary, picker);
    }

    fn select_image_from(&mut self, source: ImageSource, picker: &mut dyn MediaPicker) {
        match picker.pick(source) {
            Some(image) => {
                debug!("Picked image from {:?}", source);
                self.image = Some(image);
            }
            None => warn!("Image not found in {:?} selection", source),
        }
    }

    /// Starts classifying the current image without waiting for it.
    pub fn submit(&self) -> ClassificationTask {
        self.orchestrator.submit(self.image.clone())
    }

    /// Classifies the current image and shows the outcome.
    pub async fn classify(&mut self) -> Completion {
        let completion = self.submit().wait().await;
        self.apply(&completion);
        completion
    }

    /// Shows `completion` unless a newer call has been submitted since.
    /// Returns whether the screen changed.
    pub fn apply(&mut self, completion: &Completion) -> bool {
        if !self.orchestrator.is_current(completion) {
            debug!(
                "Discarding stale completion {} (latest is {})",
                completion.generation,
                self.orchestrator.latest_generation()
            );
            return false;
        }

        match &completion.outcome {
            Outcome::Succeeded { label, .. } => {
                self.alert = None;
                self.result_text = format!("This is a {}", label);
            }
            Outcome::Failed(ClassifierError::NoImage) => {
                self.alert = None;
                self.result_text = ClassifierError::NoImage.to_string();
            }
            Outcome::Failed(err) => {
                error!("{}", err);
                self.show_alert(alert_title(err));
            }
        }
        true
    }
}

fn alert_title(err: &ClassifierError) -> &'static str {
    match err {
        ClassifierError::ModelLoad(_) => "Unable to create a request",
        ClassifierError::NoImage => "Image doesn't exist",
        ClassifierError::Conversion(_) => "Unable to read the image",
        ClassifierError::ClassificationUnavailable(_) => "Unable to get the results",
        ClassifierError::Execution(_) => "Failed to get the description",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestBuilder;

    struct NoCamera {
        picks: usize,
    }

    impl MediaPicker for NoCamera {
        fn is_source_available(&self, source: ImageSource) -> bool {
            source == ImageSource::PhotoLibrary
        }

        fn pick(&mut self, _source: ImageSource) -> Option<Image> {
            self.picks += 1;
            None
        }
    }

    #[test]
    fn test_missing_camera_shows_alert() {
        let mut screen = Screen::new(Orchestrator::new(RequestBuilder::new()));
        let mut picker = NoCamera { picks: 0 };
        screen.take_photo(&mut picker);

        assert_eq!(screen.alert(), Some(&Alert::new("Camera doesn't exist")));
        assert_eq!(picker.picks, 0);
    }

    #[test]
    fn test_empty_pick_keeps_previous_image() {
        let mut screen = Screen::new(Orchestrator::new(RequestBuilder::new()));
        let previous = Image::from_rgba8(1, 1, vec![1, 2, 3, 255]);
        screen.set_image(Some(previous.clone()));

        screen.choose_photo(&mut NoCamera { picks: 0 });
        assert_eq!(screen.image(), Some(&previous));
        assert!(screen.alert().is_none());
    }

    #[test]
    fn test_alert_titles() {
        assert_eq!(
            alert_title(&ClassifierError::ClassificationUnavailable(String::new())),
            "Unable to get the results"
        );
        assert_eq!(alert_title(&ClassifierError::Conversion(String::new())), "Unable to read the image");
    }
}
