//! Pilotage du processus de rendu audio externe (protocole esclave mplayer)

use crate::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Un processus de rendu vivant
///
/// Le contrôleur garantit qu'il en existe au plus un à la fois.
#[async_trait]
pub trait PlayerProcess: Send {
    /// Ecrit `cmd` + newline sur le canal de commande du processus
    ///
    /// Les jetons inconnus sont transmis tels quels et rejetés par le
    /// processus externe.
    async fn send_command(&mut self, cmd: &str) -> Result<()>;

    /// Arrête et libère le processus
    ///
    /// `stop` est envoyé en best-effort, puis le processus est tué ; l'attente
    /// de sortie est bornée par un timeout. Les ressources sont toujours
    /// libérées, quelles que soient les erreurs précédentes.
    async fn terminate(self: Box<Self>);
}

/// Fabrique de processus de rendu
///
/// Trait de couture : les tests instrumentent spawn/terminate via une
/// implémentation factice.
#[async_trait]
pub trait PlayerSpawner: Send + Sync {
    /// Démarre le processus externe sur `path`
    async fn spawn(&self, path: &str) -> Result<Box<dyn PlayerProcess>>;
}

/// Fabrique de processus mplayer en mode esclave
///
/// Lance `<command> -slave -quiet <path>` avec stdin en pipe pour
/// l'injection de commandes. Voir la doc du mode esclave de mplayer.
pub struct SlaveSpawner {
    command: String,
    terminate_timeout: Duration,
}

impl SlaveSpawner {
    pub fn new(command: impl Into<String>, terminate_timeout: Duration) -> Self {
        Self {
            command: command.into(),
            terminate_timeout,
        }
    }

    /// Crée la fabrique depuis la configuration globale
    pub fn new_configured() -> Self {
        let config = mesixconfig::get_config();
        Self::new(
            config.get_player_command(),
            Duration::from_millis(config.get_terminate_timeout_ms()),
        )
    }
}

#[async_trait]
impl PlayerSpawner for SlaveSpawner {
    async fn spawn(&self, path: &str) -> Result<Box<dyn PlayerProcess>> {
        let mut child = Command::new(&self.command)
            .arg("-slave")
            .arg("-quiet")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::SpawnFailed(format!("{}: {}", self.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::SpawnFailed("player stdin is not piped".to_string()))?;

        debug!(command=%self.command, path, "External player started");

        Ok(Box::new(SlaveProcess {
            child,
            stdin,
            terminate_timeout: self.terminate_timeout,
        }))
    }
}

/// Processus mplayer vivant, stdin connecté
struct SlaveProcess {
    child: Child,
    stdin: ChildStdin,
    terminate_timeout: Duration,
}

#[async_trait]
impl PlayerProcess for SlaveProcess {
    async fn send_command(&mut self, cmd: &str) -> Result<()> {
        let line = format!("{cmd}\n");
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn terminate(mut self: Box<Self>) {
        // Best-effort : le processus est peut-être déjà mort
        let _ = self.send_command("stop").await;
        let _ = self.child.start_kill();

        if timeout(self.terminate_timeout, self.child.wait())
            .await
            .is_err()
        {
            // kill_on_drop fait le reste
            warn!(
                "External player did not exit within {:?}",
                self.terminate_timeout
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let spawner = SlaveSpawner::new("/definitely/not/a/player", Duration::from_millis(100));
        let err = spawner.spawn("/a.mp3").await.err().unwrap();
        assert!(matches!(err, Error::SpawnFailed(_)));
    }

    #[tokio::test]
    async fn test_terminate_is_bounded() {
        // `cat` rejette les options du mode esclave et sort aussitôt ;
        // terminate doit rester borné même sur un processus déjà mort
        let spawner = SlaveSpawner::new("cat", Duration::from_millis(500));
        let player = spawner.spawn("/dev/null").await.unwrap();
        player.terminate().await;
    }
}
