use crate::feedback::speech::{AudioClip, SpeechService};
use crate::prelude::{AudioError, AudioResult};
use crate::telemetry::LogManager;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const DEFAULT_CHUNK_CHARS: usize = 180;
pub const DEFAULT_LOOKAHEAD: usize = 2;

/// Device audio output. `play` resolves when the clip finishes or is stopped.
pub trait AudioPlayer: Send + Sync + 'static {
    fn play(&self, clip: AudioClip) -> impl Future<Output = AudioResult<()>> + Send;

    /// Stops and unloads the playing clip, if any.
    fn stop(&self);
}

/// Splits text on sentence boundaries into chunks of at most `max_chars`
/// characters. A single sentence longer than the limit is split on words.
pub fn chunk_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let push_piece = |piece: &str, current: &mut String, chunks: &mut Vec<String>| {
        let piece = piece.trim();
        if piece.is_empty() {
            return;
        }
        let joined_len = current.chars().count() + piece.chars().count() + 1;
        if !current.is_empty() && joined_len > max_chars {
            chunks.push(std::mem::take(current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(piece);
    };

    for sentence in text.split_inclusive(&['.', '!', '?'][..]) {
        if sentence.trim().chars().count() <= max_chars {
            push_piece(sentence, &mut current, &mut chunks);
        } else {
            for word in sentence.split_whitespace() {
                push_piece(word, &mut current, &mut chunks);
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Owns the single app-wide audio stream.
///
/// Every play request releases the previous stream first, so at most one clip
/// plays at a time. Multi-chunk speech is synthesized ahead of playback through
/// a bounded queue and checks the cancellation flag between chunks.
pub struct AudioEngine<S, P> {
    speech: Arc<S>,
    player: Arc<P>,
    current: Mutex<Option<u64>>,
    next_handle: AtomicU64,
    cancelled: Arc<AtomicBool>,
    lookahead: usize,
    max_chunk_chars: usize,
    logger: LogManager,
}

impl<S: SpeechService, P: AudioPlayer> AudioEngine<S, P> {
    pub fn new(speech: S, player: P) -> Self {
        Self::with_buffering(speech, player, DEFAULT_LOOKAHEAD, DEFAULT_CHUNK_CHARS)
    }

    pub fn with_buffering(speech: S, player: P, lookahead: usize, max_chunk_chars: usize) -> Self {
        Self {
            speech: Arc::new(speech),
            player: Arc::new(player),
            current: Mutex::new(None),
            next_handle: AtomicU64::new(1),
            cancelled: Arc::new(AtomicBool::new(false)),
            lookahead: lookahead.max(1),
            max_chunk_chars,
            logger: LogManager::new("audio"),
        }
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<u64>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.slot().is_some()
    }

    /// Stops and releases the current stream. No-op when nothing plays.
    pub fn stop(&self) -> bool {
        let released = self.slot().take();
        if let Some(handle) = released {
            self.player.stop();
            self.logger.record(&format!("released playback {}", handle));
            true
        } else {
            false
        }
    }

    pub async fn play(&self, clip: AudioClip) -> AudioResult<()> {
        self.stop();
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        *self.slot() = Some(handle);

        let result = self.player.play(clip).await;

        let mut slot = self.slot();
        if *slot == Some(handle) {
            *slot = None;
        }
        result
    }

    /// Synthesizes and plays one utterance.
    pub async fn speak(&self, text: &str) -> AudioResult<()> {
        let clip = self.speech.synthesize(text).await?;
        self.play(clip).await
    }

    /// Speaks long text chunk by chunk, synthesizing up to `lookahead` chunks
    /// ahead of playback. Returns the number of chunks played.
    pub async fn speak_buffered(&self, text: &str) -> AudioResult<usize> {
        let chunks = chunk_speech(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Ok(0);
        }
        self.cancelled.store(false, Ordering::SeqCst);

        let (tx, mut rx) = mpsc::channel::<AudioResult<AudioClip>>(self.lookahead);
        let speech = Arc::clone(&self.speech);
        let cancelled = Arc::clone(&self.cancelled);
        let producer = tokio::spawn(async move {
            for chunk in chunks {
                if cancelled.load(Ordering::SeqCst) {
                    break;
                }
                let clip = speech.synthesize(&chunk).await;
                if tx.send(clip).await.is_err() {
                    break;
                }
            }
        });

        let mut played = 0;
        while let Some(clip) = rx.recv().await {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }
            let clip = match clip {
                Ok(clip) => clip,
                Err(err) => {
                    producer.abort();
                    return Err(err);
                }
            };
            if let Err(err) = self.play(clip).await {
                producer.abort();
                return Err(err);
            }
            played += 1;
        }

        if self.cancelled.load(Ordering::SeqCst) {
            producer.abort();
            self.logger
                .record(&format!("buffered speech cancelled after {} chunks", played));
            return Err(AudioError::Cancelled);
        }
        Ok(played)
    }

    /// Aborts buffered speech between chunks and stops the current clip.
    pub fn clear(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct EchoSpeech {
        fail_on: Option<String>,
    }

    impl SpeechService for EchoSpeech {
        async fn synthesize(&self, text: &str) -> AudioResult<AudioClip> {
            if self.fail_on.as_deref() == Some(text) {
                return Err(AudioError::Synthesis("voice unavailable".into()));
            }
            Ok(AudioClip::new(text.as_bytes().to_vec(), "audio/mpeg"))
        }

        async fn transcribe(&self, _audio: Vec<u8>, _mime: &str) -> AudioResult<String> {
            Ok(String::new())
        }
    }

    #[derive(Default)]
    struct LogPlayer {
        events: Mutex<Vec<String>>,
        clip_ms: u64,
    }

    impl LogPlayer {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AudioPlayer for LogPlayer {
        async fn play(&self, clip: AudioClip) -> AudioResult<()> {
            let text = String::from_utf8_lossy(&clip.bytes).to_string();
            self.events.lock().unwrap().push(format!("play:{text}"));
            if self.clip_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.clip_ms)).await;
            }
            Ok(())
        }

        fn stop(&self) {
            self.events.lock().unwrap().push("stop".into());
        }
    }

    #[test]
    fn chunking_respects_sentence_boundaries() {
        let chunks = chunk_speech("Call for help. Start compressions now! Push hard.", 30);
        assert_eq!(
            chunks,
            vec!["Call for help.", "Start compressions now!", "Push hard."]
        );
        let merged = chunk_speech("Call for help. Push hard.", 100);
        assert_eq!(merged, vec!["Call for help. Push hard."]);
        assert!(chunk_speech("   ", 10).is_empty());
    }

    #[test]
    fn oversized_sentence_is_split_on_words() {
        let chunks = chunk_speech("one two three four five six", 9);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 9));
        assert_eq!(chunks.join(" "), "one two three four five six");
    }

    #[tokio::test]
    async fn play_releases_a_still_loaded_stream_first() {
        let engine = AudioEngine::new(EchoSpeech::default(), LogPlayer::default());
        assert!(!engine.stop());
        engine.speak("first").await.unwrap();
        assert!(!engine.is_playing());

        *engine.slot() = Some(99);
        engine.speak("second").await.unwrap();
        assert_eq!(
            engine.player().events(),
            vec!["play:first", "stop", "play:second"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_playback_unloads_clip() {
        let engine = Arc::new(AudioEngine::new(
            EchoSpeech::default(),
            LogPlayer {
                clip_ms: 1_000,
                ..Default::default()
            },
        ));
        let playing = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.speak("long message").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(engine.is_playing());
        assert!(engine.stop());
        assert!(!engine.stop());
        playing.await.unwrap().unwrap();
        assert_eq!(engine.player().events(), vec!["play:long message", "stop"]);
    }

    #[tokio::test]
    async fn buffered_speech_plays_every_chunk_in_order() {
        let engine = AudioEngine::with_buffering(EchoSpeech::default(), LogPlayer::default(), 2, 16);
        let played = engine
            .speak_buffered("Check breathing. Call 911. Begin CPR.")
            .await
            .unwrap();
        assert_eq!(played, 3);
        assert_eq!(
            engine.player().events(),
            vec!["play:Check breathing.", "play:Call 911.", "play:Begin CPR."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clear_aborts_between_chunks() {
        let engine = Arc::new(AudioEngine::with_buffering(
            EchoSpeech::default(),
            LogPlayer {
                clip_ms: 500,
                ..Default::default()
            },
            1,
            6,
        ));
        let speaking = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.speak_buffered("One. Two. Three. Four.").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.clear();

        assert_eq!(speaking.await.unwrap(), Err(AudioError::Cancelled));
        let plays = engine
            .player()
            .events()
            .iter()
            .filter(|event| event.starts_with("play:"))
            .count();
        assert_eq!(plays, 1);
    }

    #[tokio::test]
    async fn synthesis_failure_surfaces_to_caller() {
        let engine = AudioEngine::with_buffering(
            EchoSpeech {
                fail_on: Some("Two.".into()),
            },
            LogPlayer::default(),
            1,
            5,
        );
        let result = engine.speak_buffered("One. Two. Three.").await;
        assert!(matches!(result, Err(AudioError::Synthesis(_))));
        assert_eq!(engine.player().events(), vec!["play:One."]);
    }
}
