//! Roster do time: nomes, WhatsApp, apelidos e regras de atribuição padrão
//!
//! Carregado de YAML (`team.members_file`). Sem arquivo, o roster vem das
//! variáveis `TEAM_MEMBER_<NOME>=<chat id>`.

use crate::utils::{title_case, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use trello::matching::{names_match, normalize, words_match};
use trello::members::is_admin_name;

const ENV_PREFIX: &str = "TEAM_MEMBER_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Palavras que, no conteúdo do card, apontam para este membro
    #[serde(default)]
    pub default_keywords: Vec<String>,
    /// Candidato à atribuição de último recurso
    #[serde(default)]
    pub fallback: bool,
}

impl TeamMember {
    pub fn new(name: impl Into<String>, whatsapp: Option<String>) -> Self {
        Self {
            name: name.into(),
            whatsapp,
            aliases: Vec::new(),
            default_keywords: Vec::new(),
            fallback: false,
        }
    }

    /// Nome principal seguido dos apelidos
    pub fn all_names(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }

    pub fn whatsapp(&self) -> Option<&str> {
        self.whatsapp
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TeamFile {
    #[serde(default)]
    members: Vec<TeamMember>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    members: Vec<TeamMember>,
    admin_names: Vec<String>,
}

impl TeamDirectory {
    pub fn new(members: Vec<TeamMember>, admin_names: Vec<String>) -> Self {
        Self {
            members,
            admin_names,
        }
    }

    /// Lê o roster de um arquivo YAML (arquivo ausente = roster vazio)
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("⚠️ Arquivo de time não encontrado: {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    pub fn parse_yaml(content: &str) -> AppResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: TeamFile = serde_yaml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("team.yaml inválido: {}", e)))?;
        Ok(Self::new(file.members, Vec::new()))
    }

    /// Roster a partir de `TEAM_MEMBER_<NOME>=<chat id>`
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut members: Vec<TeamMember> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let raw = key.strip_prefix(ENV_PREFIX)?;
                let name = title_case(&raw.replace('_', " "));
                if name.is_empty() {
                    return None;
                }
                let whatsapp = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                Some(TeamMember::new(name, whatsapp))
            })
            .collect();

        members.sort_by(|a, b| a.name.cmp(&b.name));
        Self::new(members, Vec::new())
    }

    /// Arquivo YAML, com fallback para variáveis de ambiente quando vazio
    pub fn load_or_env(path: impl AsRef<Path>, admin_names: Vec<String>) -> AppResult<Self> {
        let mut directory = Self::load(path)?;
        if directory.members.is_empty() {
            directory = Self::from_env();
            tracing::info!(
                "👥 Roster carregado de variáveis de ambiente ({} membros)",
                directory.members.len()
            );
        }
        directory.admin_names = admin_names;
        Ok(directory)
    }

    /// Persiste o roster em YAML
    pub fn save(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let file = TeamFile {
            members: self.members.clone(),
        };
        let yaml = serde_yaml::to_string(&file)
            .map_err(|e| AppError::Storage(format!("Falha ao serializar time: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn admin_names(&self) -> &[String] {
        &self.admin_names
    }

    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    /// Busca por nome (case-insensitive, sem acentos)
    pub fn get(&self, name: &str) -> Option<&TeamMember> {
        let wanted = normalize(name);
        self.members.iter().find(|m| normalize(&m.name) == wanted)
    }

    /// Insere ou substitui um membro. Retorna `true` se for novo.
    pub fn upsert(&mut self, member: TeamMember) -> bool {
        let wanted = normalize(&member.name);
        match self.members.iter_mut().find(|m| normalize(&m.name) == wanted) {
            Some(existing) => {
                *existing = member;
                false
            }
            None => {
                self.members.push(member);
                true
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<TeamMember> {
        let wanted = normalize(name);
        let idx = self.members.iter().position(|m| normalize(&m.name) == wanted)?;
        Some(self.members.remove(idx))
    }

    /// Membros que podem receber lembretes (não-admin e com WhatsApp)
    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members
            .iter()
            .filter(|m| m.whatsapp().is_some() && !self.is_admin_name(&m.name))
    }

    pub fn is_admin_name(&self, name: &str) -> bool {
        is_admin_name(name, &self.admin_names)
    }

    /// Resolve um nome completo (Trello, transcrição) para um membro do roster
    pub fn resolve_full_name(&self, full_name: &str) -> Option<&TeamMember> {
        if full_name.trim().is_empty() || self.is_admin_name(full_name) {
            return None;
        }

        self.members
            .iter()
            .filter(|m| !self.is_admin_name(&m.name))
            .find(|m| {
                m.all_names()
                    .any(|n| names_match(n, full_name) || words_match(n, full_name))
            })
    }

    pub fn whatsapp_for(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TeamMember::whatsapp)
    }
}
