//! Self-contained HTML viewer: conversation list on the left, transcript on the right

use super::{
    build_views, escape_html, ConversationView, RenderOptions, EMPTY_CONVERSATION_TEXT,
    NO_SELECTION_TEXT,
};
use crate::linearize::Transcript;
use std::io::{self, Write};

pub fn write<W: Write>(
    writer: &mut W,
    transcripts: &[Transcript],
    options: &RenderOptions,
) -> io::Result<()> {
    let views = build_views(transcripts, options);
    let json_data = build_json_data(&views)?;
    let page_title = escape_html(&options.page_title);
    let no_selection = js_string(NO_SELECTION_TEXT)?;
    let empty_conversation = js_string(EMPTY_CONVERSATION_TEXT)?;

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 0;
            padding: 0;
            display: flex;
            height: 100vh;
            background-color: #f5f5f5;
        }}
        .sidebar {{
            width: 300px;
            background-color: #2c3e50;
            color: white;
            overflow-y: auto;
            padding: 20px 0;
            box-shadow: 2px 0 5px rgba(0,0,0,0.1);
        }}
        .sidebar-header {{ padding: 0 20px 20px; border-bottom: 1px solid #34495e; }}
        .sidebar-header h2 {{ margin: 0; font-size: 1.5em; }}
        .conversation-list {{ list-style: none; padding: 0; margin: 0; }}
        .conversation-item {{
            padding: 15px 20px;
            border-bottom: 1px solid #34495e;
            cursor: pointer;
            transition: background-color 0.2s;
        }}
        .conversation-item:hover {{ background-color: #34495e; }}
        .conversation-item.active {{ background-color: #3498db; }}
        .conversation-title {{
            font-weight: bold;
            margin-bottom: 5px;
            white-space: nowrap;
            overflow: hidden;
            text-overflow: ellipsis;
        }}
        .conversation-date {{ font-size: 0.8em; color: #bdc3c7; }}
        .chat-container {{ flex: 1; display: flex; flex-direction: column; overflow: hidden; }}
        .chat-header {{
            padding: 20px;
            background-color: #3498db;
            color: white;
            font-size: 1.2em;
            font-weight: bold;
        }}
        .chat-messages {{ flex: 1; padding: 20px; overflow-y: auto; background-color: #ecf0f1; }}
        .message {{ margin-bottom: 15px; max-width: 80%; padding: 12px 16px; }}
        .user-message {{
            margin-left: auto;
            background-color: #3498db;
            color: white;
            border-radius: 18px 18px 0 18px;
        }}
        .ai-message {{
            margin-right: auto;
            background-color: white;
            border-radius: 18px 18px 18px 0;
            box-shadow: 0 1px 2px rgba(0,0,0,0.1);
        }}
        .message-sender {{ font-weight: bold; margin-bottom: 5px; font-size: 0.9em; }}
        .user-sender {{ text-align: right; }}
        .ai-sender {{ text-align: left; color: #2c3e50; }}
        .message-content {{ line-height: 1.5; white-space: pre-wrap; }}
        .message-content.markdown {{ white-space: normal; }}
        .message-content.markdown pre {{ background: #f4f6f7; color: #2c3e50; padding: 8px; overflow-x: auto; }}
        .reasoning-content {{
            background-color: #f8f9fa;
            border-left: 4px solid #3498db;
            padding: 10px;
            margin-top: 10px;
            font-size: 0.9em;
            color: #555;
            white-space: pre-wrap;
            border-radius: 0 0 0 4px;
        }}
        .empty-state {{
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100%;
            color: #7f8c8d;
            font-size: 1.2em;
        }}
    </style>
</head>
<body>
    <div class="sidebar">
        <div class="sidebar-header">
            <h2>{page_title}</h2>
        </div>
        <ul class="conversation-list" id="conversationList"></ul>
    </div>
    <div class="chat-container">
        <div class="chat-header" id="chatHeader">{page_title}</div>
        <div class="chat-messages" id="chatMessages"></div>
    </div>

    <script>
    const conversations = {json_data};
    const NO_SELECTION = {no_selection};
    const EMPTY_CONVERSATION = {empty_conversation};

    const conversationList = document.getElementById('conversationList');
    const chatHeader = document.getElementById('chatHeader');
    const chatMessages = document.getElementById('chatMessages');

    function showEmpty(text) {{
        const div = document.createElement('div');
        div.className = 'empty-state';
        div.textContent = text;
        chatMessages.replaceChildren(div);
    }}

    function renderTurn(turn) {{
        const isUser = turn.role === 'user';

        const messageDiv = document.createElement('div');
        messageDiv.className = 'message ' + (isUser ? 'user-message' : 'ai-message');

        const senderDiv = document.createElement('div');
        senderDiv.className = 'message-sender ' + (isUser ? 'user-sender' : 'ai-sender');
        senderDiv.textContent = turn.label;
        messageDiv.appendChild(senderDiv);

        const contentDiv = document.createElement('div');
        contentDiv.className = 'message-content';
        if (turn.content_html !== undefined) {{
            contentDiv.classList.add('markdown');
            contentDiv.innerHTML = turn.content_html;
        }} else {{
            contentDiv.textContent = turn.content;
        }}
        messageDiv.appendChild(contentDiv);

        if (turn.reasoning_content !== undefined) {{
            const reasoningDiv = document.createElement('div');
            reasoningDiv.className = 'reasoning-content';
            reasoningDiv.textContent = turn.reasoning_content;
            messageDiv.appendChild(reasoningDiv);
        }}

        return messageDiv;
    }}

    function loadConversation(conversation) {{
        chatHeader.textContent = conversation.title;
        if (conversation.turns.length === 0) {{
            showEmpty(EMPTY_CONVERSATION);
            return;
        }}
        chatMessages.replaceChildren(...conversation.turns.map(renderTurn));
        chatMessages.scrollTop = chatMessages.scrollHeight;
    }}

    function select(index) {{
        document.querySelectorAll('.conversation-item').forEach(item => {{
            item.classList.toggle('active', Number(item.dataset.index) === index);
        }});
        const conversation = conversations[index];
        history.replaceState(null, '', '#' + encodeURIComponent(conversation.id));
        loadConversation(conversation);
    }}

    conversations.forEach((conversation, index) => {{
        const li = document.createElement('li');
        li.className = 'conversation-item';
        li.dataset.index = index;

        const titleDiv = document.createElement('div');
        titleDiv.className = 'conversation-title';
        titleDiv.textContent = conversation.title;

        const dateDiv = document.createElement('div');
        dateDiv.className = 'conversation-date';
        dateDiv.textContent = conversation.date;

        li.appendChild(titleDiv);
        li.appendChild(dateDiv);
        li.addEventListener('click', () => select(index));
        conversationList.appendChild(li);
    }});

    showEmpty(NO_SELECTION);

    if (conversations.length > 0) {{
        let wanted = '';
        try {{
            wanted = decodeURIComponent(location.hash.slice(1));
        }} catch (e) {{
            wanted = '';
        }}
        const found = conversations.findIndex(c => c.id === wanted);
        select(found >= 0 ? found : 0);
    }}
    </script>
</body>
</html>
"#)?;

    Ok(())
}

/// Serialize view models for embedding inside a `<script>` element
fn build_json_data(views: &[ConversationView]) -> io::Result<String> {
    let json = serde_json::to_string(views)?;
    Ok(script_safe(&json))
}

fn js_string(s: &str) -> io::Result<String> {
    Ok(script_safe(&serde_json::to_string(s)?))
}

/// `</script>` inside a string literal would end the script element early
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearize::{SpeakerRole, Turn};

    fn render(transcripts: &[Transcript], options: &RenderOptions) -> String {
        let mut buf = Vec::new();
        write(&mut buf, transcripts, options).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> Transcript {
        Transcript {
            id: "conv-1".to_string(),
            title: "Borrow checker".to_string(),
            inserted_at: "2025-02-01T10:00:00Z".to_string(),
            updated_at: String::new(),
            turns: vec![
                Turn {
                    node_id: "1".to_string(),
                    role: SpeakerRole::User,
                    content: "why?".to_string(),
                    reasoning_content: None,
                },
                Turn {
                    node_id: "2".to_string(),
                    role: SpeakerRole::Assistant,
                    content: "because".to_string(),
                    reasoning_content: Some("thinking".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_viewer_html_is_valid() {
        let html = render(&[sample()], &RenderOptions::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
        assert!(html.contains("<title>Chat Archive</title>"));
    }

    #[test]
    fn test_viewer_embeds_transcript() {
        let html = render(&[sample()], &RenderOptions::default());
        assert!(html.contains(r#""title":"Borrow checker""#));
        assert!(html.contains(r#""date":"2025-02-01 10:00""#));
        assert!(html.contains(r#""label":"Assistant""#));
        assert!(html.contains(r#""reasoning_content":"thinking""#));
        assert!(html.contains(NO_SELECTION_TEXT));
        assert!(html.contains(EMPTY_CONVERSATION_TEXT));
    }

    #[test]
    fn test_viewer_without_conversations() {
        let html = render(&[], &RenderOptions::default());
        assert!(html.contains("const conversations = [];"));
    }

    #[test]
    fn test_script_tag_cannot_be_closed_by_content() {
        let mut t = sample();
        t.turns[0].content = "</script><script>alert(1)</script>".to_string();
        let html = render(&[t], &RenderOptions::default());
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn test_page_title_is_escaped() {
        let options = RenderOptions {
            page_title: "<b>Mine</b>".to_string(),
            ..Default::default()
        };
        let html = render(&[], &options);
        assert!(html.contains("<title>&lt;b&gt;Mine&lt;/b&gt;</title>"));
    }

    #[test]
    fn test_malformed_hash_falls_back_to_first() {
        let html = render(&[sample()], &RenderOptions::default());
        let decode = html.find("decodeURIComponent(location.hash").unwrap();
        let guard = html[..decode].rfind("try {").unwrap();
        assert!(html[guard..].contains("catch (e)"));
        assert!(html.contains("select(found >= 0 ? found : 0);"));
    }

    #[test]
    fn test_markdown_html_is_embedded() {
        let options = RenderOptions {
            markdown: true,
            ..Default::default()
        };
        let html = render(&[sample()], &options);
        assert!(html.contains("content_html"));
        assert!(html.contains("<p>because<\\/p>"));
    }
}
