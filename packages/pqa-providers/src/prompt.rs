//! Prompt construction for grounded answers and follow-up question rewriting.

use pqa_domain::{ConversationTurn, RetrievedDocument};

use crate::chat::ChatMessage;

/// The generator must reply with exactly this phrase when the context holds no matching data.
pub const NO_DATA_PHRASE: &str = "未找到相关价格数据";

const EMPTY_SECTION: &str = "（无）";

const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "\
Given a chat history and the latest user question, decide whether the question can be \
answered from the chat history alone. If it cannot (especially questions about vegetable \
prices, markets, or dates), rewrite it as a standalone question that can be used to search \
for price records, resolving references such as \"it\" or \"that market\" from the history. \
If it can, return it unchanged.
Do NOT answer the question. Reply with the question text only.";

pub fn answer_messages(
	history: &[ConversationTurn],
	documents: &[RetrievedDocument],
	question: &str,
) -> Vec<ChatMessage> {
	let system = format!(
		"\
你是一个专业的蔬菜价格查询助手，回答时必须遵守以下规则：
1. 价格信息只能来自【上下文数据】，这是唯一的事实来源。
2. 只有在需要理解指代（例如“它的价格”）时才参考【历史对话】。
3. 历史对话中出现的价格也必须用【上下文数据】核实。

【历史对话】：
{history}

【上下文数据】：
{context}

回答要求：
- 包含品种、市场、价格（最低价/最高价/平均价）和日期。
- 如果没有相关数据，直接回复“{NO_DATA_PHRASE}”。
- 不得编造任何信息，所有内容必须来自【上下文数据】。
- 语言简洁自然，符合口语表达习惯。",
		history = render_history(history),
		context = render_context(documents),
	);
	let mut messages = Vec::with_capacity(history.len() * 2 + 2);

	messages.push(ChatMessage::system(system));
	messages.extend(history_messages(history));
	messages.push(ChatMessage::user(question));

	messages
}

pub fn contextualize_messages(history: &[ConversationTurn], question: &str) -> Vec<ChatMessage> {
	let mut messages = Vec::with_capacity(history.len() * 2 + 2);

	messages.push(ChatMessage::system(CONTEXTUALIZE_SYSTEM_PROMPT));
	messages.extend(history_messages(history));
	messages.push(ChatMessage::user(question));

	messages
}

fn history_messages(history: &[ConversationTurn]) -> impl Iterator<Item = ChatMessage> + '_ {
	history.iter().flat_map(|turn| {
		[ChatMessage::user(turn.question.as_str()), ChatMessage::assistant(turn.answer.as_str())]
	})
}

fn render_history(history: &[ConversationTurn]) -> String {
	if history.is_empty() {
		return EMPTY_SECTION.to_string();
	}

	history
		.iter()
		.map(|turn| format!("用户：{}\n助手：{}", turn.question, turn.answer))
		.collect::<Vec<_>>()
		.join("\n")
}

fn render_context(documents: &[RetrievedDocument]) -> String {
	if documents.is_empty() {
		return EMPTY_SECTION.to_string();
	}

	documents
		.iter()
		.map(|document| document.content.as_str())
		.collect::<Vec<_>>()
		.join("\n\n")
}
