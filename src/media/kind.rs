use crate::sys::mediastreamer::*;

/**
What a filter does, as far as codec lookup is concerned.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Other,
    Encoder,
    Decoder,
    EncodingCapturer,
    DecoderRenderer,
}

impl Category {
    pub fn from_raw(raw: MSFilterCategory) -> Self {
        match raw {
            MS_FILTER_ENCODER => Category::Encoder,
            MS_FILTER_DECODER => Category::Decoder,
            MS_FILTER_ENCODING_CAPTURER => Category::EncodingCapturer,
            MS_FILTER_DECODER_RENDERER => Category::DecoderRenderer,
            _ => Category::Other,
        }
    }

    pub fn raw(self) -> MSFilterCategory {
        match self {
            Category::Other => MS_FILTER_OTHER,
            Category::Encoder => MS_FILTER_ENCODER,
            Category::Decoder => MS_FILTER_DECODER,
            Category::EncodingCapturer => MS_FILTER_ENCODING_CAPTURER,
            Category::DecoderRenderer => MS_FILTER_DECODER_RENDERER,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

/**
A family of methods a filter can implement, such as the audio decoder methods.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    Begin,
    Player,
    Recorder,
    VideoDisplay,
    EchoCanceller,
    VideoDecoder,
    VideoCapture,
    AudioDecoder,
    VideoEncoder,
    AudioCapture,
    AudioPlayback,
    AudioEncoder,
    Void,
}

impl Interface {
    pub fn raw(self) -> MSFilterInterfaceId {
        match self {
            Interface::Begin => MSFilterInterfaceBegin,
            Interface::Player => MSFilterPlayerInterface,
            Interface::Recorder => MSFilterRecorderInterface,
            Interface::VideoDisplay => MSFilterVideoDisplayInterface,
            Interface::EchoCanceller => MSFilterEchoCancellerInterface,
            Interface::VideoDecoder => MSFilterVideoDecoderInterface,
            Interface::VideoCapture => MSFilterVideoCaptureInterface,
            Interface::AudioDecoder => MSFilterAudioDecoderInterface,
            Interface::VideoEncoder => MSFilterVideoEncoderInterface,
            Interface::AudioCapture => MSFilterAudioCaptureInterface,
            Interface::AudioPlayback => MSFilterAudioPlaybackInterface,
            Interface::AudioEncoder => MSFilterAudioEncoderInterface,
            Interface::Void => MSFilterVoidInterface,
        }
    }
}
