//! Voice interaction pipeline integration tests
//!
//! Runs the assistant against scripted services; no network or audio hardware

use std::sync::Arc;

use baatgpt::{AudioUpload, Error, PLACEHOLDER_REPLY, Role, Session, Turn};

mod common;
use common::{
    ChatBehavior, SYSTEM_PROMPT, ScriptedChat, ScriptedSynth, ScriptedTranscriber, assistant,
    wav_upload,
};

#[tokio::test]
async fn test_capital_of_pakistan_scenario() {
    let stt = Arc::new(ScriptedTranscriber::new(&["What is the capital of Pakistan?"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Fixed(
        "Islamabad is the capital of Pakistan.",
    )));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    let interaction = assistant.interact(&mut session, &wav_upload()).await.unwrap();

    assert_eq!(interaction.transcript, "What is the capital of Pakistan?");
    assert_eq!(interaction.reply.content, "Islamabad is the capital of Pakistan.");
    assert!(!interaction.reply.placeholder);
    assert!(interaction.warning.is_none());

    let audio = interaction.audio.expect("reply audio");
    assert!(!audio.data.is_empty());
    assert_eq!(audio.mime, "audio/wav");

    assert_eq!(
        session.history().snapshot(),
        &[
            Turn::user("What is the capital of Pakistan?"),
            Turn::assistant("Islamabad is the capital of Pakistan."),
        ]
    );
}

#[tokio::test]
async fn test_transcript_becomes_user_turn_verbatim() {
    // Leading whitespace as Whisper often returns it
    let stt = Arc::new(ScriptedTranscriber::new(&[" Assalam o alaikum, kya haal hai?"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    assistant.interact(&mut session, &wav_upload()).await.unwrap();

    let first = &session.history().snapshot()[0];
    assert_eq!(first.role(), Role::User);
    assert_eq!(first.content(), " Assalam o alaikum, kya haal hai?");
}

#[tokio::test]
async fn test_n_interactions_alternate_user_assistant() {
    let questions = ["one?", "two?", "three?", "four?"];
    let stt = Arc::new(ScriptedTranscriber::new(&questions));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    for _ in &questions {
        assistant.interact(&mut session, &wav_upload()).await.unwrap();
    }

    let turns = session.history().snapshot();
    assert_eq!(turns.len(), 2 * questions.len());

    for (i, pair) in turns.chunks(2).enumerate() {
        assert_eq!(pair[0], Turn::user(questions[i]));
        assert_eq!(pair[1], Turn::assistant(format!("reply {}", i + 1)));
    }
}

#[tokio::test]
async fn test_full_history_sent_and_system_prompt_not_stored() {
    let stt = Arc::new(ScriptedTranscriber::new(&["first", "second"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    assistant.interact(&mut session, &wav_upload()).await.unwrap();
    assistant.interact(&mut session, &wav_upload()).await.unwrap();

    let requests = chat.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0].0, SYSTEM_PROMPT);
    assert_eq!(requests[0].1, vec![Turn::user("first")]);

    assert_eq!(requests[1].0, SYSTEM_PROMPT);
    assert_eq!(
        requests[1].1,
        vec![
            Turn::user("first"),
            Turn::assistant("reply 1"),
            Turn::user("second"),
        ]
    );

    assert!(
        session
            .history()
            .snapshot()
            .iter()
            .all(|t| t.role() != Role::System)
    );
}

#[tokio::test]
async fn test_transcription_failure_halts_before_chat() {
    let stt = Arc::new(ScriptedTranscriber::failing());
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    let err = assistant
        .interact(&mut session, &wav_upload())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transcription(_)));
    assert_eq!(stt.calls(), 1);
    assert_eq!(chat.calls(), 0);
    assert_eq!(tts.calls(), 0);
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_staged_upload_removed_after_failed_transcription() {
    let staging = tempfile::tempdir().unwrap();
    let stt = Arc::new(ScriptedTranscriber::failing().watching(staging.path()));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts).with_staging_dir(staging.path());
    let mut session = Session::new();

    let err = assistant
        .interact(&mut session, &wav_upload())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transcription(_)));
    assert_eq!(*stt.staged_during_call.lock().unwrap(), vec![1]);
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_staged_upload_removed_after_success() {
    let staging = tempfile::tempdir().unwrap();
    let stt = Arc::new(ScriptedTranscriber::new(&["hello"]).watching(staging.path()));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts).with_staging_dir(staging.path());
    let mut session = Session::new();

    assistant.interact(&mut session, &wav_upload()).await.unwrap();

    assert_eq!(*stt.staged_during_call.lock().unwrap(), vec![1]);
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_transcription_failure_leaves_prior_history_untouched() {
    let stt = Arc::new(ScriptedTranscriber::new(&["hello"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    assistant.interact(&mut session, &wav_upload()).await.unwrap();
    let before = session.history().snapshot().to_vec();

    // Queue exhausted: the next transcription fails
    assert!(assistant.interact(&mut session, &wav_upload()).await.is_err());
    assert_eq!(session.history().snapshot(), before.as_slice());
    assert_eq!(chat.calls(), 1);
}

#[tokio::test]
async fn test_chat_failure_keeps_user_turn_only() {
    let stt = Arc::new(ScriptedTranscriber::new(&["Tell me about Lahore"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Fail));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    let err = assistant
        .interact(&mut session, &wav_upload())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Chat(_)));
    assert_eq!(
        session.history().snapshot(),
        &[Turn::user("Tell me about Lahore")]
    );
    assert_eq!(tts.calls(), 0);
}

#[tokio::test]
async fn test_missing_reply_field_uses_placeholder() {
    let stt = Arc::new(ScriptedTranscriber::new(&["hello?"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Placeholder));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    let interaction = assistant.interact(&mut session, &wav_upload()).await.unwrap();

    assert!(interaction.reply.placeholder);
    assert_eq!(interaction.reply.content, PLACEHOLDER_REPLY);
    assert_eq!(
        session.history().last(),
        Some(&Turn::assistant(PLACEHOLDER_REPLY))
    );
}

#[tokio::test]
async fn test_synthesis_failure_is_a_warning() {
    let stt = Arc::new(ScriptedTranscriber::new(&["hello?"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Fixed("Walaikum assalam!")));
    let tts = Arc::new(ScriptedSynth::failing());
    let assistant = assistant(&stt, &chat, &tts);
    let mut session = Session::new();

    let interaction = assistant.interact(&mut session, &wav_upload()).await.unwrap();

    assert_eq!(interaction.reply.content, "Walaikum assalam!");
    assert!(interaction.audio.is_none());
    assert!(interaction.warning.unwrap().contains("espeak-ng"));
    assert_eq!(session.history().len(), 2);
    assert_eq!(
        session.history().last(),
        Some(&Turn::assistant("Walaikum assalam!"))
    );
}

#[tokio::test]
async fn test_mp3_upload_declares_mpeg() {
    let stt = Arc::new(ScriptedTranscriber::new(&["hi"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);

    let upload = AudioUpload::new("clip.MP3", None, vec![0xFF, 0xFB, 0x90, 0x00]).unwrap();
    assistant.transcribe(&upload).await.unwrap();

    assert_eq!(stt.last_mime.lock().unwrap().as_deref(), Some("audio/mpeg"));
}

#[tokio::test]
async fn test_sessions_have_independent_histories() {
    let stt = Arc::new(ScriptedTranscriber::new(&["from a", "from b"]));
    let chat = Arc::new(ScriptedChat::new(ChatBehavior::Numbered));
    let tts = Arc::new(ScriptedSynth::ok());
    let assistant = assistant(&stt, &chat, &tts);
    let mut a = Session::new();
    let mut b = Session::new();

    assistant.interact(&mut a, &wav_upload()).await.unwrap();
    assistant.interact(&mut b, &wav_upload()).await.unwrap();

    assert_eq!(a.history().snapshot()[0], Turn::user("from a"));
    assert_eq!(b.history().snapshot()[0], Turn::user("from b"));
    assert_eq!(chat.requests.lock().unwrap()[1].1, vec![Turn::user("from b")]);
}
